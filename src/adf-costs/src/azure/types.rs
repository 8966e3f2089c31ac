use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::WINDOW_LEAD_DAYS;

/// Bounds both pipeline-run and activity-run queries. `after < before` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    after: DateTime<Utc>,
    before: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidWindow {
    /// Start is not strictly before the end
    Inverted {
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    },

    /// Bounds fall outside the representable date range
    OutOfRange { days: u32 },
}

impl fmt::Display for InvalidWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidWindow::Inverted { after, before } => write!(
                f,
                "time window start {} is not before its end {}",
                after, before
            ),
            InvalidWindow::OutOfRange { days } => {
                write!(f, "a {} day lookback is out of the supported date range", days)
            }
        }
    }
}

impl std::error::Error for InvalidWindow {}

impl TimeWindow {
    pub fn new(after: DateTime<Utc>, before: DateTime<Utc>) -> Result<Self, InvalidWindow> {
        if after < before {
            Ok(Self { after, before })
        } else {
            Err(InvalidWindow::Inverted { after, before })
        }
    }

    /// `[now - days, now + 1 day]`
    pub fn lookback(days: u32, now: DateTime<Utc>) -> Result<Self, InvalidWindow> {
        let out_of_range = || InvalidWindow::OutOfRange { days };

        let after = Duration::try_days(i64::from(days))
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .ok_or_else(out_of_range)?;
        let before = Duration::try_days(WINDOW_LEAD_DAYS)
            .and_then(|lead| now.checked_add_signed(lead))
            .ok_or_else(out_of_range)?;

        Self::new(after, before)
    }

    pub fn after(&self) -> DateTime<Utc> {
        self.after
    }

    pub fn before(&self) -> DateTime<Utc> {
        self.before
    }

    pub fn filter(&self, continuation_token: Option<String>) -> RunFilter {
        RunFilter {
            continuation_token,
            last_updated_after: self.after,
            last_updated_before: self.before,
        }
    }
}

/// Request body shared by `queryPipelineRuns` and `queryActivityruns`.
///
/// The service returns an empty result for a body holding only a token,
/// so the window is always sent alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
    pub last_updated_after: DateTime<Utc>,
    pub last_updated_before: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub run_id: String,
    pub pipeline_name: String,
}

/// One page of a run query, `value` left undecoded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

impl QueryPage {
    pub fn next_token(&self) -> Option<&str> {
        self.continuation_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }

    pub fn pipeline_runs(&self) -> Result<Vec<PipelineRun>, serde_json::Error> {
        Vec::<PipelineRun>::deserialize(&self.value)
    }

    pub fn into_candidates(self) -> Option<Vec<Value>> {
        match self.value {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// `Authorization` header value, `"{token_type} {access_token}"`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token_type: &str, access_token: &str) -> Self {
        Self(format!("{} {}", token_type, access_token))
    }

    pub fn header_value(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn window_requires_start_before_end() {
        assert!(TimeWindow::new(at(1), at(2)).is_ok());
        assert_eq!(
            TimeWindow::new(at(2), at(2)),
            Err(InvalidWindow::Inverted {
                after: at(2),
                before: at(2)
            })
        );
        assert!(TimeWindow::new(at(3), at(2)).is_err());
    }

    #[test]
    fn lookback_window_extends_one_day_past_now() {
        let window = TimeWindow::lookback(7, at(10)).unwrap();
        assert_eq!(window.after(), at(3));
        assert_eq!(window.before(), at(11));
    }

    #[test]
    fn zero_day_lookback_is_still_a_valid_window() {
        let window = TimeWindow::lookback(0, at(10)).unwrap();
        assert_eq!(window.after(), at(10));
    }

    #[test]
    fn oversized_lookback_is_an_error() {
        assert_eq!(
            TimeWindow::lookback(u32::MAX, at(10)),
            Err(InvalidWindow::OutOfRange { days: u32::MAX })
        );
        assert_eq!(
            TimeWindow::lookback(1, DateTime::<Utc>::MAX_UTC),
            Err(InvalidWindow::OutOfRange { days: 1 })
        );
    }

    #[test]
    fn filter_body_uses_camel_case_and_omits_missing_token() {
        let window = TimeWindow::new(at(1), at(2)).unwrap();

        let body = serde_json::to_value(window.filter(None)).unwrap();
        assert_eq!(
            body,
            json!({
                "lastUpdatedAfter": "2024-03-01T12:00:00Z",
                "lastUpdatedBefore": "2024-03-02T12:00:00Z",
            })
        );

        let body = serde_json::to_value(window.filter(Some("abc".into()))).unwrap();
        assert_eq!(body["continuationToken"], "abc");
    }

    #[test]
    fn empty_continuation_token_ends_pagination() {
        let page: QueryPage =
            serde_json::from_value(json!({"value": [], "continuationToken": ""})).unwrap();
        assert_eq!(page.next_token(), None);

        let page: QueryPage = serde_json::from_value(json!({"value": []})).unwrap();
        assert_eq!(page.next_token(), None);
    }

    #[test]
    fn page_value_decodes_into_pipeline_runs() {
        let page: QueryPage = serde_json::from_value(json!({
            "value": [
                {"runId": "r1", "pipelineName": "copy", "status": "Succeeded"},
                {"runId": "r2", "pipelineName": "load"}
            ],
            "continuationToken": "next"
        }))
        .unwrap();

        let runs = page.pipeline_runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].run_id, "r2");
        assert_eq!(page.next_token(), Some("next"));
    }

    #[test]
    fn missing_or_non_list_value_is_malformed() {
        let page: QueryPage = serde_json::from_value(json!({"continuationToken": "x"})).unwrap();
        assert!(page.pipeline_runs().is_err());
        assert!(page.into_candidates().is_none());

        let page: QueryPage = serde_json::from_value(json!({"value": {"runId": "r1"}})).unwrap();
        assert!(page.pipeline_runs().is_err());
    }

    #[test]
    fn bearer_token_is_not_printed() {
        let token = BearerToken::new("Bearer", "secret");
        assert_eq!(token.header_value(), "Bearer secret");
        assert!(!format!("{:?}", token).contains("secret"));
    }
}
