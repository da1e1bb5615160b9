//! Prometheus-compatible query backend.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::{PrunerError, PrunerResult};

/// Per-request timeout
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Shown when queries go straight to the regional AMP host
pub const UNSIGNED_REQUESTS_WARNING: &str = "No --endpoint given: queries are sent unsigned to the \
AMP workspace, which rejects them. Point --endpoint (or AMP_QUERY_ENDPOINT) at a SigV4 signing proxy.";

/// Instant query response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: QueryData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryData {
    #[serde(default)]
    pub result: Vec<Sample>,
}

/// One series of an instant vector.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sample {
    /// Series labels; absent in malformed responses
    #[serde(default)]
    pub metric: Option<BTreeMap<String, String>>,
    /// `[timestamp, "value"]`
    #[serde(default)]
    pub value: Option<Vec<Value>>,
}

impl Sample {
    /// The sample value as sent (a string).
    pub fn value_text(&self) -> Option<&str> {
        self.value.as_ref()?.get(1)?.as_str()
    }
}

/// Runs instant queries.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    async fn query(&self, promql: &str) -> PrunerResult<QueryResponse>;
}

/// Query URL of an Amazon Managed Service for Prometheus workspace.
///
/// `endpoint` replaces the regional host, e.g. a local SigV4 signing proxy.
pub fn workspace_query_url(region: &str, workspace_id: &str, endpoint: Option<&str>) -> String {
    let base = endpoint.map_or_else(
        || format!("https://aps-workspaces.{region}.amazonaws.com"),
        |e| e.trim_end_matches('/').to_string(),
    );
    format!("{base}/workspaces/{workspace_id}/api/v1/query")
}

/// [`MetricsBackend`] posting form-encoded queries over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMetricsBackend {
    client: reqwest::Client,
    url: String,
}

impl HttpMetricsBackend {
    pub fn new(url: impl Into<String>) -> PrunerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(QUERY_TIMEOUT)
            .build()
            .map_err(|e| PrunerError::Http {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Backend for an AMP workspace, optionally through `endpoint`.
    pub fn for_workspace(
        region: &str,
        workspace_id: &str,
        endpoint: Option<&str>,
    ) -> PrunerResult<Self> {
        Self::new(workspace_query_url(region, workspace_id, endpoint))
    }
}

#[async_trait]
impl MetricsBackend for HttpMetricsBackend {
    async fn query(&self, promql: &str) -> PrunerResult<QueryResponse> {
        let error = |reason: String| PrunerError::Query {
            query: promql.to_string(),
            reason,
        };
        let response = self
            .client
            .post(&self.url)
            .form(&[("query", promql)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| error(e.to_string()))?;
        response
            .json::<QueryResponse>()
            .await
            .map_err(|e| error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_url() {
        assert_eq!(
            workspace_query_url("us-east-1", "ws-1234", None),
            "https://aps-workspaces.us-east-1.amazonaws.com/workspaces/ws-1234/api/v1/query"
        );
        assert_eq!(
            workspace_query_url("us-east-1", "ws-1234", Some("http://localhost:8005/")),
            "http://localhost:8005/workspaces/ws-1234/api/v1/query"
        );
    }

    #[test]
    fn test_sample_parsing() {
        let response: QueryResponse = serde_json::from_str(
            r#"{"status":"success","data":{"resultType":"vector","result":[
                {"metric":{"job":"node"},"value":[1700000000.123,"1"]},
                {"value":[1700000000.123,"4"]}
            ]}}"#,
        )
        .unwrap();

        let samples = &response.data.result;
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].metric.as_ref().unwrap()["job"], "node");
        assert_eq!(samples[0].value_text(), Some("1"));
        assert!(samples[1].metric.is_none());
    }

    #[test]
    fn test_empty_envelope() {
        let response: QueryResponse = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(response.data.result.is_empty());
    }
}
