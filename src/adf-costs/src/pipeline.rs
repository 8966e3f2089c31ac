use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::azure::{DataFactoryClient, TimeWindow, TokenProvider};
use crate::config::Config;
use crate::costs::output::{write_detailed_file, write_summary_file};
use crate::costs::{CostReport, CostReporter, CsvFormat, RunCollector, ScanStats, SummaryRow};

pub struct ReportOutcome {
    pub window: TimeWindow,
    pub report: CostReport,
    pub summary: Vec<SummaryRow>,
    pub stats: ScanStats,
}

/// Scan, join and write, wired from one [`Config`].
///
/// The HTTP client, token provider and factory client are built once here
/// and shared by every query of the scan.
pub struct CostPipeline {
    config: Config,
    tokens: TokenProvider,
    factory: DataFactoryClient,
    reporter: CostReporter,
}

impl CostPipeline {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_reporter(config, CostReporter::default())
    }

    pub fn with_reporter(config: Config, reporter: CostReporter) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("adf-costs/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;

        let tokens = TokenProvider::new(client.clone(), &config)
            .context("failed to build token endpoint url")?;
        let factory =
            DataFactoryClient::new(client, &config).context("failed to build factory url")?;

        Ok(Self {
            config,
            tokens,
            factory,
            reporter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Collects billed activity runs updated in `[now - lookback, now + 1 day]`
    /// and prices them.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ReportOutcome> {
        let window = TimeWindow::lookback(self.config.lookback_days, now)?;
        tracing::info!(
            factory = %self.config.factory_name,
            after = %window.after(),
            before = %window.before(),
            "Starting cost scan"
        );

        let collection = RunCollector::new(&self.factory, &self.tokens)
            .collect_billable(window)
            .await
            .context("authentication with the identity endpoint failed")?;

        let report = self.reporter.build_report(&collection.activities);
        let unmatched = report.unmatched().count();
        if unmatched > 0 {
            tracing::warn!(unmatched, "Activity runs without a matching rate");
        }
        let summary = report.summarize();

        Ok(ReportOutcome {
            window,
            report,
            summary,
            stats: collection.stats,
        })
    }

    pub fn write_outputs(&self, outcome: &ReportOutcome) -> Result<()> {
        let format = CsvFormat::from(&self.config);

        write_detailed_file(&self.config.output_path, &outcome.report, format)?;
        tracing::info!(path = %self.config.output_path.display(), rows = outcome.report.records.len(), "Wrote cost report");

        if self.config.write_summary {
            write_summary_file(&self.config.summary_output_path, &outcome.summary, format)?;
            tracing::info!(path = %self.config.summary_output_path.display(), rows = outcome.summary.len(), "Wrote summarized cost report");
        }

        Ok(())
    }
}
