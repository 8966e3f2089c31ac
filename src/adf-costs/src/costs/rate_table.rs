//! Data Factory pipeline prices, from
//! <https://azure.microsoft.com/en-us/pricing/details/data-factory/data-pipeline/>

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateEntry {
    pub activity_type: String,
    pub execution_environment: String,
    pub cost_per_unit: f64,
}

impl RateEntry {
    pub fn new(activity_type: &str, execution_environment: &str, cost_per_unit: f64) -> Self {
        Self {
            activity_type: activity_type.to_string(),
            execution_environment: execution_environment.to_string(),
            cost_per_unit,
        }
    }
}

const PUBLISHED_RATES: [(&str, &str, f64); 7] = [
    ("DataMovement", "AzureIR", 0.225),
    ("DataMovement", "SelfhostedIR", 0.090),
    ("ExternalActivity", "AzureIR", 0.000225),
    ("ExternalActivity", "SelfhostedIR", 0.000090),
    ("PipelineActivity", "AzureIR", 0.005),
    ("PipelineActivity", "SelfhostedIR", 0.001800),
    ("executedataflow", "General", 0.242),
];

/// Per-unit cost keyed by `(activity type, execution environment)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    entries: Vec<RateEntry>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self::published()
    }
}

impl RateTable {
    pub fn published() -> Self {
        Self::from_entries(
            PUBLISHED_RATES
                .iter()
                .map(|(activity_type, environment, cost)| {
                    RateEntry::new(activity_type, environment, *cost)
                })
                .collect(),
        )
    }

    pub fn from_entries(entries: Vec<RateEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RateEntry] {
        &self.entries
    }

    /// Every entry for the key. Exact, case-sensitive match.
    pub fn matching<'a>(
        &'a self,
        activity_type: &'a str,
        meter_type: &'a str,
    ) -> impl Iterator<Item = &'a RateEntry> + 'a {
        self.entries.iter().filter(move |entry| {
            entry.activity_type == activity_type && entry.execution_environment == meter_type
        })
    }

    pub fn lookup(&self, activity_type: &str, meter_type: &str) -> Option<&RateEntry> {
        self.entries.iter().find(|entry| {
            entry.activity_type == activity_type && entry.execution_environment == meter_type
        })
    }
}
