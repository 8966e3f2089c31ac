pub mod billing;
pub mod collector;
pub mod output;
pub mod rate_table;
pub mod report;

pub use billing::ActivityRun;
pub use collector::{ActivityFetcher, Collection, RunCollector, RunPaginator, ScanStats};
pub use output::CsvFormat;
pub use rate_table::{RateEntry, RateTable};
pub use report::{CostRecord, CostReport, CostReporter, SummaryGroup, SummaryRow};
