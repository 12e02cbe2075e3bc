//! Confluence content connector.

mod types;

#[cfg(test)]
mod tests;

pub use types::{
    BodyValue, ContentPage, Links, PageBody, SearchResult, SpaceRecord, SpaceRef, User, Version,
};

use crate::config::WikiConfig;
use crate::error::{classify_status, ConnectorError, Result, Service};
use crate::markup::strip_html;
use reqwest::{header, RequestBuilder, Response, Url};
use std::time::Duration;
use types::{Ancestor, PageWrite, SpaceKey, SpaceList, StorageBody, VersionNumber};

/// Expansion used by [`ContentConnector::get_page`] when none is given.
pub const DEFAULT_EXPAND: &str = "body.view,version,space";

/// Default page size for search and space listing.
pub const DEFAULT_LIMIT: u32 = 25;

/// Confluence REST connector.
pub struct ContentConnector {
    client: reqwest::Client,
    api_url: Url,
    user: String,
    api_token: String,
}

impl ContentConnector {
    /// Create a connector from validated configuration.
    pub fn new(config: &WikiConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ConnectorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let api_url = format!("{}/wiki/rest/api", config.base_url);
        let api_url = Url::parse(&api_url).map_err(|e| {
            ConnectorError::Config(format!("Invalid Confluence URL {}: {}", config.base_url, e))
        })?;
        if api_url.cannot_be_a_base() {
            return Err(ConnectorError::Config(format!(
                "Cannot use {} as a base URL",
                config.base_url
            )));
        }

        Ok(Self {
            client,
            api_url,
            user: config.user.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// Build a URL under the REST root, encoding each path segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConnectorError::Config(format!("Cannot use {} as a base URL", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Single interception point: authenticate, send, classify failures.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .basic_auth(&self.user, Some(&self.api_token))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = classify_status(Service::Wiki, status.as_u16(), body);
        tracing::warn!("Confluence request failed: {}", err);
        Err(err)
    }

    /// Fetch a page with its view body reduced to plain text.
    ///
    /// Whatever `expand` asks for, the returned body holds only the stripped
    /// view representation.
    pub async fn get_page(&self, page_id: &str, expand: Option<&[&str]>) -> Result<ContentPage> {
        let expand = match expand {
            Some(fields) if !fields.is_empty() => fields.join(","),
            _ => DEFAULT_EXPAND.to_string(),
        };
        tracing::info!("Fetching page {} (expand={})", page_id, expand);

        let mut page: ContentPage = self
            .send(
                self.client
                    .get(self.url(&["content", page_id])?)
                    .query(&[("expand", expand.as_str())]),
            )
            .await?
            .json()
            .await?;

        let view = page
            .body
            .as_ref()
            .and_then(|b| b.view.as_ref())
            .map(|v| v.value.as_str())
            .unwrap_or_default();

        page.body = Some(PageBody {
            storage: None,
            view: Some(BodyValue::view(strip_html(view))),
        });
        Ok(page)
    }

    /// Run a CQL query. Results are returned as the store sent them.
    pub async fn search(&self, cql: &str, limit: u32) -> Result<SearchResult> {
        tracing::info!("Searching with CQL: {}", cql);
        let limit = limit.to_string();

        let result = self
            .send(
                self.client
                    .get(self.url(&["content", "search"])?)
                    .query(&[("cql", cql), ("limit", limit.as_str())]),
            )
            .await?
            .json()
            .await?;
        Ok(result)
    }

    pub async fn list_spaces(&self, limit: u32) -> Result<Vec<SpaceRecord>> {
        let list: SpaceList = self
            .send(
                self.client
                    .get(self.url(&["space"])?)
                    .query(&[("limit", limit)]),
            )
            .await?
            .json()
            .await?;

        tracing::info!("Found {} spaces", list.results.len());
        Ok(list.results)
    }

    /// Create a page. `content` must already be in storage format.
    pub async fn create_page(
        &self,
        space_key: &str,
        title: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<ContentPage> {
        tracing::info!("Creating page '{}' in space {}", title, space_key);

        let request = PageWrite {
            id: None,
            page_type: "page",
            title,
            space: SpaceKey { key: space_key },
            body: StorageBody::new(content),
            ancestors: parent_id.map(|id| Ancestor { id }).into_iter().collect(),
            version: None,
        };

        let page = self
            .send(self.client.post(self.url(&["content"])?).json(&request))
            .await?
            .json()
            .await?;
        Ok(page)
    }

    /// Replace a page's title and body.
    ///
    /// Reads the current version and space first, then writes version + 1.
    /// A concurrent edit in between makes the store reject the write; that
    /// error is returned as is.
    pub async fn update_page(&self, page_id: &str, title: &str, content: &str) -> Result<ContentPage> {
        let current: ContentPage = self
            .send(
                self.client
                    .get(self.url(&["content", page_id])?)
                    .query(&[("expand", "version,space")]),
            )
            .await?
            .json()
            .await?;

        let version = current.version.as_ref().map(|v| v.number).ok_or_else(|| {
            ConnectorError::Decode(format!("Page {} has no version number", page_id))
        })?;
        let space_key = current.space.as_ref().map(|s| s.key.as_str()).ok_or_else(|| {
            ConnectorError::Decode(format!("Page {} has no space", page_id))
        })?;

        tracing::info!(
            "Updating page {} from version {} to {}",
            page_id,
            version,
            version + 1
        );

        let request = PageWrite {
            id: Some(page_id),
            page_type: "page",
            title,
            space: SpaceKey { key: space_key },
            body: StorageBody::new(content),
            ancestors: Vec::new(),
            version: Some(VersionNumber {
                number: version + 1,
            }),
        };

        let page = self
            .send(
                self.client
                    .put(self.url(&["content", page_id])?)
                    .json(&request),
            )
            .await?
            .json()
            .await?;
        Ok(page)
    }
}
