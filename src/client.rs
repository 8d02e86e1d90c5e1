//! Work-item tracking client.
//!
//! The pipeline only needs two remote operations: run a WIQL query that
//! returns matching work item ids, and fetch a single work item with its
//! fields. [`WorkItemClient`] captures that contract so callers receive a
//! client handle explicitly instead of relying on ambient connection
//! state, and tests can inject a mock.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// REST API version sent with every request.
const API_VERSION: &str = "7.1";

/// Errors from the work-item tracking service.
///
/// All of these are fatal to the current invocation; there is no retry.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to tracking service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("tracking service returned {status} for {url}")]
    Status { status: StatusCode, url: String },
}

/// A work item as returned by the tracking service: an id plus a flat
/// field map keyed by fully qualified field name.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItem {
    pub id: u64,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl WorkItem {
    /// Read a string field, returning `""` when the field is absent or
    /// not a string.
    pub fn field_str(&self, name: &str) -> &str {
        self.fields.get(name).and_then(Value::as_str).unwrap_or("")
    }
}

/// Client contract for the work-item tracking service.
#[async_trait]
pub trait WorkItemClient {
    /// Run a WIQL query and return the matching work item ids, in the
    /// order the service reports them.
    async fn query_ids(&self, wiql: &str) -> Result<Vec<u64>, ClientError>;

    /// Fetch a single work item with all its fields.
    async fn get_work_item(&self, id: u64) -> Result<WorkItem, ClientError>;
}

/// WIQL request body.
#[derive(Debug, Serialize)]
struct WiqlRequest<'a> {
    query: &'a str,
}

/// WIQL response: the service returns work item references, we only need
/// the ids.
#[derive(Debug, Deserialize)]
struct WiqlResponse {
    #[serde(rename = "workItems", default)]
    work_items: Vec<WorkItemRef>,
}

#[derive(Debug, Deserialize)]
struct WorkItemRef {
    id: u64,
}

/// Azure DevOps REST implementation of [`WorkItemClient`].
///
/// Authenticates with a Personal Access Token over HTTP basic auth
/// (empty username, PAT as password).
pub struct AzureDevOpsClient {
    http_client: reqwest::Client,
    base_url: String,
    project: String,
    pat: String,
}

impl AzureDevOpsClient {
    /// Create a client for an organization and project.
    pub fn new(
        organization: &str,
        project: &str,
        pat: &str,
        timeout_seconds: u64,
    ) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            base_url: format!("https://dev.azure.com/{}", organization),
            project: project.to_string(),
            pat: pat.to_string(),
        })
    }

    fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ClientError::Status {
                status,
                url: response.url().to_string(),
            })
        }
    }
}

#[async_trait]
impl WorkItemClient for AzureDevOpsClient {
    async fn query_ids(&self, wiql: &str) -> Result<Vec<u64>, ClientError> {
        let url = format!(
            "{}/{}/_apis/wit/wiql?api-version={}",
            self.base_url, self.project, API_VERSION
        );
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .basic_auth("", Some(&self.pat))
            .json(&WiqlRequest { query: wiql })
            .send()
            .await?;

        let response = Self::check_status(response)?;
        let body: WiqlResponse = response.json().await?;

        Ok(body.work_items.into_iter().map(|r| r.id).collect())
    }

    async fn get_work_item(&self, id: u64) -> Result<WorkItem, ClientError> {
        let url = format!(
            "{}/_apis/wit/workitems/{}?api-version={}",
            self.base_url, id, API_VERSION
        );
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .basic_auth("", Some(&self.pat))
            .send()
            .await?;

        let response = Self::check_status(response)?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_work_item_field_str() {
        let item: WorkItem = serde_json::from_value(json!({
            "id": 1234,
            "fields": {
                "System.AreaPath": "/MSTeams/Foo",
                "System.Rev": 7
            }
        }))
        .unwrap();

        assert_eq!(item.id, 1234);
        assert_eq!(item.field_str("System.AreaPath"), "/MSTeams/Foo");
        // Missing and non-string fields both read as empty.
        assert_eq!(item.field_str("Microsoft.VSTS.TCM.AutomationStatus"), "");
        assert_eq!(item.field_str("System.Rev"), "");
    }

    #[test]
    fn test_wiql_response_parsing() {
        let body: WiqlResponse = serde_json::from_str(
            r#"{"queryType": "flat", "workItems": [{"id": 1234, "url": "x"}, {"id": 1236, "url": "y"}]}"#,
        )
        .unwrap();

        let ids: Vec<u64> = body.work_items.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1234, 1236]);
    }

    #[test]
    fn test_wiql_response_without_items() {
        let body: WiqlResponse = serde_json::from_str(r#"{"queryType": "flat"}"#).unwrap();
        assert!(body.work_items.is_empty());
    }
}
