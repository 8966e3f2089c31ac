#![allow(dead_code)]

use std::path::Path;

use adf_costs::config::Config;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const FACTORY_PATH: &str =
    "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.DataFactory/factories/adf-1";

/// Config pointing both endpoints at the mock server and outputs into `dir`.
pub fn config_for(server: &MockServer, dir: &Path) -> Config {
    Config {
        client_id: "client-1".to_string(),
        client_secret: "s3cret".to_string(),
        tenant_id: "tenant-1".to_string(),
        subscription_id: "sub-1".to_string(),
        resource_group: "rg-1".to_string(),
        factory_name: "adf-1".to_string(),
        lookback_days: 7,
        management_endpoint: server.uri(),
        login_endpoint: server.uri(),
        token_resource: "https://management.core.windows.net/".to_string(),
        api_version: "2018-06-01".to_string(),
        output_path: dir.join("ADF_costs.csv"),
        summary_output_path: dir.join("ADF_costs_summarized.csv"),
        write_summary: true,
        delimiter: ",".to_string(),
        decimal_comma: false,
    }
}

pub async fn mount_token(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "integration-token"
        })))
        .expect(times)
        .mount(server)
        .await;
}

pub fn billed_activity(id: &str, activity_type: &str, meter_type: &str, duration: f64) -> Value {
    json!({
        "activityName": format!("activity {id}"),
        "activityRunId": id,
        "activityType": "Copy",
        "status": "Succeeded",
        "activityRunStart": "2024-01-05T09:00:00.1234567Z",
        "activityRunEnd": "2024-01-05T09:02:00.7654321Z",
        "durationInMs": 120000,
        "output": {
            "billingReference": {
                "activityType": activity_type,
                "billableDuration": [
                    {"meterType": meter_type, "duration": duration, "unit": "Hours"}
                ]
            }
        }
    })
}

pub fn unbilled_activity(id: &str) -> Value {
    json!({
        "activityName": format!("activity {id}"),
        "activityRunId": id,
        "activityType": "IfCondition",
        "status": "Succeeded",
        "activityRunStart": "2024-01-05T09:00:00Z",
        "activityRunEnd": "2024-01-05T09:00:01Z",
        "output": {"expression": true}
    })
}
