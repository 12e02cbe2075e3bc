//! Configuration management for boardwiki.

use crate::error::{ConnectorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Azure Boards (work-item store) settings.
    pub boards: BoardsConfig,

    /// Confluence (wiki) settings.
    pub wiki: WikiConfig,
}

/// Azure Boards configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardsConfig {
    /// Organization URL (e.g., "https://dev.azure.com/contoso").
    pub org_url: String,
    /// Personal access token (or environment variable name if prefixed with $).
    pub pat: String,
    /// Project name.
    pub project: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Confluence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Site URL (e.g., "https://contoso.atlassian.net").
    pub base_url: String,
    /// Account e-mail / username.
    pub user: String,
    /// API token (or environment variable name if prefixed with $).
    pub api_token: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

pub const ENV_BOARDS_URL: &str = "AZURE_DEVOPS_ORG_URL";
pub const ENV_BOARDS_PAT: &str = "AZURE_DEVOPS_PAT";
pub const ENV_BOARDS_PROJECT: &str = "AZURE_DEVOPS_PROJECT";
pub const ENV_WIKI_URL: &str = "CONFLUENCE_URL";
pub const ENV_WIKI_USER: &str = "CONFLUENCE_USER";
pub const ENV_WIKI_TOKEN: &str = "CONFLUENCE_API_TOKEN";

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ConnectorError::Config("Could not find config directory".to_string())
        })?;

        Ok(config_dir.join("boardwiki").join("config.toml"))
    }

    /// Build configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let boards_keys = [ENV_BOARDS_URL, ENV_BOARDS_PAT, ENV_BOARDS_PROJECT];
        let wiki_keys = [ENV_WIKI_URL, ENV_WIKI_USER, ENV_WIKI_TOKEN];

        let [org_url, pat, project] = require_all(&lookup, boards_keys)?;
        let [base_url, user, api_token] = require_all(&lookup, wiki_keys)?;

        let config = Self {
            boards: BoardsConfig {
                org_url,
                pat,
                project,
                timeout_secs: default_timeout(),
            },
            wiki: WikiConfig {
                base_url,
                user,
                api_token,
                timeout_secs: default_timeout(),
            },
        };
        config.validate()
    }

    /// Load configuration from a TOML file, resolving `$VAR` references.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConnectorError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let mut config: Config = toml::from_str(&content)?;

        for (name, value) in [
            (ENV_BOARDS_URL, &mut config.boards.org_url),
            (ENV_BOARDS_PAT, &mut config.boards.pat),
            (ENV_BOARDS_PROJECT, &mut config.boards.project),
            (ENV_WIKI_URL, &mut config.wiki.base_url),
            (ENV_WIKI_USER, &mut config.wiki.user),
            (ENV_WIKI_TOKEN, &mut config.wiki.api_token),
        ] {
            *value = resolve_env(name, value)?;
        }

        config.validate()
    }

    /// Load from `path` if given, otherwise the default file if it exists,
    /// otherwise the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }

        match Self::default_path() {
            Ok(default) if default.exists() => Self::load_from(&default),
            _ => Self::from_env(),
        }
    }

    /// Reject empty values and normalize URLs.
    pub fn validate(mut self) -> Result<Self> {
        let required = [
            (ENV_BOARDS_URL, &self.boards.org_url),
            (ENV_BOARDS_PAT, &self.boards.pat),
            (ENV_BOARDS_PROJECT, &self.boards.project),
            (ENV_WIKI_URL, &self.wiki.base_url),
            (ENV_WIKI_USER, &self.wiki.user),
            (ENV_WIKI_TOKEN, &self.wiki.api_token),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(ConnectorError::Config(format!(
                "Missing required values: {}",
                missing.join(", ")
            )));
        }

        self.wiki.base_url = strip_trailing_slash(&self.wiki.base_url);
        self.boards.org_url = strip_trailing_slash(&self.boards.org_url);
        Ok(self)
    }
}

fn require_all<F, const N: usize>(lookup: &F, keys: [&str; N]) -> Result<[String; N]>
where
    F: Fn(&str) -> Option<String>,
{
    let values = keys.map(|key| lookup(key).filter(|v| !v.trim().is_empty()));
    let missing: Vec<&str> = keys
        .iter()
        .zip(values.iter())
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| *k)
        .collect();

    if !missing.is_empty() {
        return Err(ConnectorError::Config(format!(
            "Missing required environment variables: {}",
            missing.join(", ")
        )));
    }

    Ok(values.map(Option::unwrap_or_default))
}

/// Strip exactly one trailing slash.
fn strip_trailing_slash(url: &str) -> String {
    url.strip_suffix('/').unwrap_or(url).to_string()
}

/// Resolve a `$VAR` reference for the setting `name`. Other values pass
/// through unchanged.
fn resolve_env(name: &str, value: &str) -> Result<String> {
    match value.strip_prefix('$') {
        Some(var_name) => std::env::var(var_name).map_err(|_| {
            ConnectorError::Config(format!(
                "{} references ${}, which is not set",
                name, var_name
            ))
        }),
        None => Ok(value.to_string()),
    }
}
