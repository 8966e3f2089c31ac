use reqwest::Client;
use url::Url;

use super::error::FetchError;
use super::types::{BearerToken, QueryPage, RunFilter};
use crate::config::Config;

/// The two Data Factory run queries the collector depends on.
pub trait FactoryApi {
    async fn query_pipeline_runs(
        &self,
        token: &BearerToken,
        filter: &RunFilter,
    ) -> Result<QueryPage, FetchError>;

    async fn query_activity_runs(
        &self,
        token: &BearerToken,
        run_id: &str,
        filter: &RunFilter,
    ) -> Result<QueryPage, FetchError>;
}

/// REST client for a single data factory.
///
/// Holds one `reqwest::Client`, built once and shared by every query of a scan.
pub struct DataFactoryClient {
    client: Client,
    factory_url: Url,
    api_version: String,
}

impl DataFactoryClient {
    pub fn new(client: Client, config: &Config) -> Result<Self, url::ParseError> {
        // trailing slash keeps `join` from replacing the factory segment
        let factory_url = Url::parse(&format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.DataFactory/factories/{}/",
            config.management_endpoint.trim_end_matches('/'),
            config.subscription_id,
            config.resource_group,
            config.factory_name
        ))?;

        Ok(Self {
            client,
            factory_url,
            api_version: config.api_version.clone(),
        })
    }

    fn endpoint(&self, relative: &str) -> Result<Url, FetchError> {
        let mut url = self.factory_url.join(relative)?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    async fn post_query(
        &self,
        url: Url,
        token: &BearerToken,
        filter: &RunFilter,
    ) -> Result<QueryPage, FetchError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, token.header_value())
            .json(filter)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::server_error(status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl FactoryApi for DataFactoryClient {
    async fn query_pipeline_runs(
        &self,
        token: &BearerToken,
        filter: &RunFilter,
    ) -> Result<QueryPage, FetchError> {
        let url = self.endpoint("queryPipelineRuns")?;
        tracing::debug!(%url, token = ?filter.continuation_token, "Querying pipeline runs");
        self.post_query(url, token, filter).await
    }

    async fn query_activity_runs(
        &self,
        token: &BearerToken,
        run_id: &str,
        filter: &RunFilter,
    ) -> Result<QueryPage, FetchError> {
        let url = self.endpoint(&format!("pipelineruns/{}/queryActivityruns", run_id))?;
        tracing::debug!(%url, run_id, "Querying activity runs");
        self.post_query(url, token, filter).await
    }
}
