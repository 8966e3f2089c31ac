use std::collections::HashMap;

use super::billing::ActivityRun;
use super::rate_table::{RateEntry, RateTable};

/// An activity run left-joined with its rate.
///
/// `rate` and `cost_per_activity` are `None` when no rate matches, so an
/// unmapped activity type shows up as a gap instead of a zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CostRecord {
    pub activity: ActivityRun,
    pub rate: Option<RateEntry>,
    pub cost_per_activity: Option<f64>,
}

impl CostRecord {
    pub fn cost_per_unit(&self) -> Option<f64> {
        self.rate.as_ref().map(|rate| rate.cost_per_unit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryGroup {
    pub run_id: String,
    pub pipeline_name: String,
    pub activity_type: String,
    pub unit: String,
    pub meter_type: String,
    pub cost_per_unit: Option<f64>,
    pub duration: f64,
    pub cost: Option<f64>,
}

/// A row of the summarized report. The trailing `Total` row carries only
/// the grand cost.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryRow {
    Group(SummaryGroup),
    Total { cost: f64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CostReport {
    pub records: Vec<CostRecord>,
}

/// Joins activity runs against a rate table.
pub struct CostReporter {
    rates: RateTable,
}

impl Default for CostReporter {
    fn default() -> Self {
        Self::new(RateTable::published())
    }
}

impl CostReporter {
    pub fn new(rates: RateTable) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Left join on `(activity_type, meter_type)`, one row per matching rate
    /// (or one unmatched row), in input order.
    pub fn build_report(&self, activities: &[ActivityRun]) -> CostReport {
        let records = activities
            .iter()
            .flat_map(|activity| {
                let matches: Vec<&RateEntry> = self
                    .rates
                    .matching(&activity.activity_type, &activity.meter_type)
                    .collect();

                if matches.is_empty() {
                    vec![CostRecord {
                        activity: activity.clone(),
                        rate: None,
                        cost_per_activity: None,
                    }]
                } else {
                    matches
                        .into_iter()
                        .map(|rate| CostRecord {
                            activity: activity.clone(),
                            rate: Some(rate.clone()),
                            cost_per_activity: Some(activity.duration * rate.cost_per_unit),
                        })
                        .collect()
                }
            })
            .collect();

        CostReport { records }
    }
}

#[derive(PartialEq, Eq, Hash)]
struct GroupKey<'a> {
    run_id: &'a str,
    pipeline_name: &'a str,
    activity_type: &'a str,
    unit: &'a str,
    meter_type: &'a str,
    cost_per_unit: Option<u64>,
}

impl CostReport {
    /// Sum of every matched `cost_per_activity`; unmatched rows add nothing.
    pub fn total_cost(&self) -> f64 {
        self.records
            .iter()
            .filter_map(|record| record.cost_per_activity)
            .sum()
    }

    pub fn unmatched(&self) -> impl Iterator<Item = &CostRecord> {
        self.records.iter().filter(|record| record.rate.is_none())
    }

    /// Groups by `(run_id, pipeline_name, activity_type, unit, meter_type,
    /// cost_per_unit)` in first-seen order, summing duration and cost, and
    /// appends the grand total.
    pub fn summarize(&self) -> Vec<SummaryRow> {
        let mut index: HashMap<GroupKey<'_>, usize> = HashMap::new();
        let mut groups: Vec<SummaryGroup> = Vec::new();

        for record in &self.records {
            let activity = &record.activity;
            let cost_per_unit = record.cost_per_unit();
            let key = GroupKey {
                run_id: &activity.run_id,
                pipeline_name: &activity.pipeline_name,
                activity_type: &activity.activity_type,
                unit: &activity.unit,
                meter_type: &activity.meter_type,
                cost_per_unit: cost_per_unit.map(f64::to_bits),
            };

            match index.get(&key) {
                Some(&position) => {
                    let group = &mut groups[position];
                    group.duration += activity.duration;
                    group.cost = match (group.cost, record.cost_per_activity) {
                        (Some(sum), Some(cost)) => Some(sum + cost),
                        (sum, cost) => sum.or(cost),
                    };
                }
                None => {
                    index.insert(key, groups.len());
                    groups.push(SummaryGroup {
                        run_id: activity.run_id.clone(),
                        pipeline_name: activity.pipeline_name.clone(),
                        activity_type: activity.activity_type.clone(),
                        unit: activity.unit.clone(),
                        meter_type: activity.meter_type.clone(),
                        cost_per_unit,
                        duration: activity.duration,
                        cost: record.cost_per_activity,
                    });
                }
            }
        }

        groups
            .into_iter()
            .map(SummaryRow::Group)
            .chain(std::iter::once(SummaryRow::Total {
                cost: self.total_cost(),
            }))
            .collect()
    }
}
