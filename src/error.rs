//! Error types for boardwiki.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for boardwiki.
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Remediation hint attached to wiki authentication failures.
pub const WIKI_AUTH_HINT: &str = "Authentication failed. Check your CONFLUENCE_URL, CONFLUENCE_USER, and CONFLUENCE_API_TOKEN environment variables.";

/// Remediation hint attached to work-item store authentication failures.
pub const BOARDS_AUTH_HINT: &str = "Authentication failed. Check your AZURE_DEVOPS_ORG_URL, AZURE_DEVOPS_PAT, and AZURE_DEVOPS_PROJECT environment variables.";

/// Discriminant of a [`ConnectorError`], as reported to MCP callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    RateLimit,
    Upstream,
    Transport,
    Config,
    Decode,
}

/// Connector error types.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Credential rejected by the external service (HTTP 401/403).
    #[error("{message}")]
    Authentication { status: u16, message: String },

    /// Request quota exceeded (HTTP 429).
    #[error("{message}")]
    RateLimit { message: String },

    /// Any other non-2xx response.
    #[error("{service} API error ({status}): {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
        body: String,
    },

    /// No response received at all.
    #[error("Network or unknown error: {0}")]
    Transport(String),

    /// Configuration error. Only raised at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A successful response whose body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ConnectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectorError::Authentication { .. } => ErrorKind::Auth,
            ConnectorError::RateLimit { .. } => ErrorKind::RateLimit,
            ConnectorError::Upstream { .. } => ErrorKind::Upstream,
            ConnectorError::Transport(_) => ErrorKind::Transport,
            ConnectorError::Config(_) => ErrorKind::Config,
            ConnectorError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// HTTP status carried by the error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConnectorError::Authentication { status, .. } => Some(*status),
            ConnectorError::RateLimit { .. } => Some(429),
            ConnectorError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, for upstream errors.
    pub fn body(&self) -> Option<&str> {
        match self {
            ConnectorError::Upstream { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Which external service a classified failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Boards,
    Wiki,
}

impl Service {
    fn label(self) -> &'static str {
        match self {
            Service::Boards => "Azure DevOps",
            Service::Wiki => "Confluence",
        }
    }

    fn auth_hint(self) -> &'static str {
        match self {
            Service::Boards => BOARDS_AUTH_HINT,
            Service::Wiki => WIKI_AUTH_HINT,
        }
    }
}

/// Map a non-success HTTP status and its raw body onto the error taxonomy.
///
/// - 401, 403: authentication
/// - 429: rate limit
/// - anything else: upstream, keeping status and body
///
/// The upstream message prefers a `message` field from a JSON body and falls
/// back to the raw text.
pub fn classify_status(service: Service, status: u16, body: String) -> ConnectorError {
    match status {
        401 | 403 => ConnectorError::Authentication {
            status,
            message: service.auth_hint().to_string(),
        },
        429 => ConnectorError::RateLimit {
            message: format!(
                "{} API rate limit exceeded. Please wait a moment.",
                service.label()
            ),
        },
        _ => {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| body.clone());

            ConnectorError::Upstream {
                service: service.label(),
                status,
                message,
                body,
            }
        }
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ConnectorError::Decode(e.to_string())
        } else {
            ConnectorError::Transport(e.to_string())
        }
    }
}

impl From<std::io::Error> for ConnectorError {
    fn from(e: std::io::Error) -> Self {
        ConnectorError::Transport(e.to_string())
    }
}

impl From<toml::de::Error> for ConnectorError {
    fn from(e: toml::de::Error) -> Self {
        ConnectorError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(e: serde_json::Error) -> Self {
        ConnectorError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_statuses() {
        for status in [401, 403] {
            let err = classify_status(Service::Wiki, status, "nope".to_string());
            assert_eq!(err.kind(), ErrorKind::Auth);
            assert_eq!(err.to_string(), WIKI_AUTH_HINT);
        }
    }

    #[test]
    fn test_rate_limit() {
        let err = classify_status(Service::Boards, 429, String::new());
        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(err.status(), Some(429));
    }

    #[test]
    fn test_upstream_keeps_status_and_body() {
        let body = r#"{"statusCode":404,"message":"No content found with id 42"}"#.to_string();
        let err = classify_status(Service::Wiki, 404, body.clone());

        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.body(), Some(body.as_str()));
        assert_eq!(
            err.to_string(),
            "Confluence API error (404): No content found with id 42"
        );
    }

    #[test]
    fn test_upstream_plain_text_body() {
        let err = classify_status(Service::Boards, 500, "boom".to_string());
        assert_eq!(err.to_string(), "Azure DevOps API error (500): boom");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ErrorKind::RateLimit).unwrap(),
            serde_json::json!("rate_limit")
        );
    }
}
