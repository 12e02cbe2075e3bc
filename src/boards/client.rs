//! Azure DevOps REST client for work items.

use super::{WorkItem, WorkItemApi, Wiql, TASK_FIELDS};
use crate::config::BoardsConfig;
use crate::error::{classify_status, ConnectorError, Result, Service};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_VERSION: &str = "7.1";

/// Azure Boards HTTP client.
pub struct AzureBoardsClient {
    client: reqwest::Client,
    org_url: Url,
    project: String,
    pat: String,
}

#[derive(Debug, Serialize)]
struct WiqlRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct WiqlResponse {
    #[serde(rename = "workItems", default)]
    work_items: Vec<WorkItemReference>,
}

#[derive(Debug, Deserialize)]
struct WorkItemReference {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct WorkItemList {
    #[serde(default)]
    value: Vec<WorkItem>,
}

impl AzureBoardsClient {
    /// Create a client from validated configuration.
    pub fn new(config: &BoardsConfig) -> Result<Self> {
        let org_url = Url::parse(&config.org_url).map_err(|e| {
            ConnectorError::Config(format!("Invalid organization URL {}: {}", config.org_url, e))
        })?;
        if org_url.cannot_be_a_base() {
            return Err(ConnectorError::Config(format!(
                "Cannot use {} as a base URL",
                config.org_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConnectorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            org_url,
            project: config.project.clone(),
            pat: config.pat.clone(),
        })
    }

    /// Build a URL under the organization, encoding each path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.org_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConnectorError::Config(format!("Cannot use {} as a base URL", self.org_url)))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    /// Authenticate, send and classify a request.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.basic_auth("", Some(&self.pat)).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = classify_status(Service::Boards, status.as_u16(), body);
        tracing::warn!("Azure DevOps request failed: {}", err);
        Err(err)
    }
}

#[async_trait]
impl WorkItemApi for AzureBoardsClient {
    async fn query_ids(&self, wiql: &Wiql) -> Result<Vec<i64>> {
        let url = self.endpoint(&[self.project.as_str(), "_apis", "wit", "wiql"])?;
        tracing::debug!(query = %wiql, "Running WIQL query");

        let response: WiqlResponse = self
            .send(self.client.post(url).json(&WiqlRequest { query: wiql.as_str() }))
            .await?
            .json()
            .await?;

        Ok(response.work_items.into_iter().map(|r| r.id).collect())
    }

    async fn get_work_items(&self, ids: &[i64]) -> Result<Vec<WorkItem>> {
        let mut url = self.endpoint(&["_apis", "wit", "workitems"])?;
        let ids: Vec<String> = ids.iter().map(i64::to_string).collect();
        url.query_pairs_mut()
            .append_pair("ids", &ids.join(","))
            .append_pair("fields", &TASK_FIELDS.join(","));

        let response: WorkItemList = self.send(self.client.get(url)).await?.json().await?;
        Ok(response.value)
    }

    async fn get_work_item(&self, id: i64) -> Result<WorkItem> {
        let id = id.to_string();
        let url = self.endpoint(&["_apis", "wit", "workitems", id.as_str()])?;
        let item = self.send(self.client.get(url)).await?.json().await?;
        Ok(item)
    }
}
