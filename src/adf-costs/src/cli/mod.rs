mod commands;

pub use commands::{Cli, Command, ReportArgs};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;

use crate::config::{ConfigLoader, ConfigOverrides};
use crate::costs::RateTable;
use crate::logging::setup_logging;
use crate::pipeline::CostPipeline;

/// Parses the command line and runs the chosen command to completion.
pub fn process_command() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_file.as_deref())?;

    match &cli.command {
        Command::Rates { json } => print_rates(&RateTable::published(), *json),
        Command::Report(args) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?
            .block_on(report(&cli, args)),
    }
}

async fn report(cli: &Cli, args: &ReportArgs) -> Result<()> {
    let config = ConfigLoader::load(cli.config.as_deref(), &ConfigOverrides::from(args))?;
    tracing::debug!(?config, "Loaded configuration");

    let pipeline = CostPipeline::new(config)?;
    let outcome = pipeline.run(Utc::now()).await?;
    pipeline.write_outputs(&outcome)?;

    let config = pipeline.config();
    println!(
        "{} {} billed activity runs across {} pipeline runs",
        "Collected".green().bold(),
        outcome.stats.billable,
        outcome.stats.runs_seen
    );
    println!(
        "{} {:.6}",
        "Total cost:".bold(),
        outcome.report.total_cost()
    );
    let unmatched = outcome.report.unmatched().count();
    if unmatched > 0 {
        println!(
            "{} {} rows have no matching rate",
            "Warning:".yellow().bold(),
            unmatched
        );
    }
    if outcome.stats.runs_skipped > 0 || outcome.stats.pages_failed > 0 {
        println!(
            "{} {} runs and {} pages could not be fetched",
            "Warning:".yellow().bold(),
            outcome.stats.runs_skipped,
            outcome.stats.pages_failed
        );
    }
    println!("Report written to {}", config.output_path.display());
    if config.write_summary {
        println!("Summary written to {}", config.summary_output_path.display());
    }

    Ok(())
}

fn print_rates(rates: &RateTable, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rates.entries())?);
        return Ok(());
    }

    println!(
        "{:<20} {:<15} {:>12}",
        "Type".bold(),
        "IR".bold(),
        "Cost/unit".bold()
    );
    for entry in rates.entries() {
        println!(
            "{:<20} {:<15} {:>12}",
            entry.activity_type, entry.execution_environment, entry.cost_per_unit
        );
    }
    Ok(())
}
