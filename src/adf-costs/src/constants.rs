pub const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
pub const LOGIN_ENDPOINT: &str = "https://login.microsoftonline.com";
pub const TOKEN_RESOURCE: &str = "https://management.core.windows.net/";
pub const API_VERSION: &str = "2018-06-01";

pub const DEFAULT_OUTPUT_PATH: &str = "ADF_costs.csv";
pub const DEFAULT_SUMMARY_OUTPUT_PATH: &str = "ADF_costs_summarized.csv";
pub const DEFAULT_DELIMITER: &str = ",";

// queries look one day past "now" so runs still in flight are included
pub const WINDOW_LEAD_DAYS: i64 = 1;
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

pub const TOTAL_ROW_SENTINEL: &str = "TOTAL";

pub const DEFAULT_LOG_FILTER: &str = "info";
