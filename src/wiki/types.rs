//! Confluence REST payloads.

use serde::{Deserialize, Serialize};

/// A wiki page, as returned by the content API.
///
/// Fields the connector does not interpret are kept in `extra` and passed
/// through to callers unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPage {
    pub id: String,
    #[serde(rename = "type", default)]
    pub page_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<PageBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<SpaceRef>,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<BodyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<BodyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyValue {
    pub value: String,
    pub representation: String,
}

impl BodyValue {
    pub fn view(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            representation: "view".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceRef {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webui: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

/// A wiki space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceRecord {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub space_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<serde_json::Value>,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpaceList {
    #[serde(default)]
    pub results: Vec<SpaceRecord>,
}

/// Result of a CQL search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub results: Vec<ContentPage>,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "totalSize", default)]
    pub total_size: u64,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

/// Body for page creation and update.
#[derive(Debug, Serialize)]
pub(crate) struct PageWrite<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    #[serde(rename = "type")]
    pub page_type: &'static str,
    pub title: &'a str,
    pub space: SpaceKey<'a>,
    pub body: StorageBody<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ancestors: Vec<Ancestor<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionNumber>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SpaceKey<'a> {
    pub key: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct StorageBody<'a> {
    pub storage: StorageValue<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StorageValue<'a> {
    pub value: &'a str,
    pub representation: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct Ancestor<'a> {
    pub id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct VersionNumber {
    pub number: u64,
}

impl<'a> StorageBody<'a> {
    pub fn new(value: &'a str) -> Self {
        Self {
            storage: StorageValue {
                value,
                representation: "storage",
            },
        }
    }
}
