pub mod azure;
pub mod cli;
pub mod config;
pub mod constants;
pub mod costs;
pub mod logging;
pub mod pipeline;

pub use pipeline::{CostPipeline, ReportOutcome};
