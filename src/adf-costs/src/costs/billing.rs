use serde::Deserialize;
use serde_json::Value;

use crate::azure::{PipelineRun, RecordShapeError};

/// A billed activity run, flattened with its parent pipeline run.
///
/// Start and end times are kept as the service sent them, with its
/// seven-digit fractions.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRun {
    pub run_id: String,
    pub pipeline_name: String,
    pub activity_name: String,
    pub activity_run_id: String,
    pub status: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub meter_type: String,
    pub duration: f64,
    pub activity_type: String,
    pub unit: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawActivityRun {
    activity_name: String,
    activity_run_id: String,
    status: String,
    #[serde(default)]
    activity_run_start: Option<String>,
    #[serde(default)]
    activity_run_end: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BillingReference {
    activity_type: String,
    billable_duration: Vec<BillableDuration>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BillableDuration {
    meter_type: String,
    duration: f64,
    unit: String,
}

/// Decodes one activity-run candidate.
///
/// `Ok(None)` when its output has no `billingReference` (control-flow
/// activities that are not metered), `Err` when the block is present but
/// unusable. Only the first `billableDuration` entry is used.
pub fn billable_activity(
    parent: &PipelineRun,
    candidate: &Value,
) -> Result<Option<ActivityRun>, RecordShapeError> {
    let Some(billing) = candidate
        .get("output")
        .and_then(|output| output.get("billingReference"))
    else {
        return Ok(None);
    };

    let raw = RawActivityRun::deserialize(candidate)?;
    let billing = BillingReference::deserialize(billing)?;
    let duration = billing
        .billable_duration
        .into_iter()
        .next()
        .ok_or(RecordShapeError::NoBillableDuration)?;

    Ok(Some(ActivityRun {
        run_id: parent.run_id.clone(),
        pipeline_name: parent.pipeline_name.clone(),
        activity_name: raw.activity_name,
        activity_run_id: raw.activity_run_id,
        status: raw.status,
        start_time: raw.activity_run_start,
        end_time: raw.activity_run_end,
        meter_type: duration.meter_type,
        duration: duration.duration,
        activity_type: billing.activity_type,
        unit: duration.unit,
    }))
}

/// Best-effort id for log fields when a candidate fails to decode.
pub fn candidate_id(candidate: &Value) -> &str {
    candidate
        .get("activityRunId")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
}
