use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;

#[derive(Parser, Clone, Debug)]
#[clap(
    name = "adf-costs",
    about = "Cost report for Azure Data Factory pipeline runs",
    version,
    after_help = "Credentials are read from the environment or a .env file: client_id, client_secret, tenant_id, subscription_id, rg_name, adf_name, last_updated_days"
)]
pub struct Cli {
    /// TOML file with settings; environment variables take precedence
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[clap(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect billed activity runs and write the cost reports
    Report(ReportArgs),

    /// Show the rate table used to price activity runs
    Rates {
        /// Output the table in JSON format
        #[clap(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Number of days to look back from now
    #[clap(long)]
    pub lookback_days: Option<u32>,

    /// Path of the detailed cost report
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    /// Path of the summarized cost report
    #[clap(long)]
    pub summary_output: Option<PathBuf>,

    /// Skip the summarized cost report
    #[clap(long)]
    pub no_summary: bool,
}

impl From<&ReportArgs> for ConfigOverrides {
    fn from(args: &ReportArgs) -> Self {
        Self {
            lookback_days: args.lookback_days,
            output_path: args.output.clone(),
            summary_output_path: args.summary_output.clone(),
            write_summary: args.no_summary.then_some(false),
        }
    }
}
