//! # boardwiki
//!
//! Azure Boards and Confluence connectors exposed as MCP (Model Context
//! Protocol) tools.
//!
//! ## Features
//!
//! - Active task listing with batched work-item fetches
//! - Task details, child tasks, per-type listing and task counts
//! - Confluence page read, search, space listing, create and update
//! - One error taxonomy for both services (auth, rate limit, upstream, transport)
//! - MCP server over stdio or HTTP
//!
//! ## Usage
//!
//! ```bash
//! # Check that all six settings are present
//! boardwiki validate
//!
//! # MCP server over stdio (for Claude Desktop and similar)
//! boardwiki mcp
//!
//! # MCP server over HTTP on port 3005
//! boardwiki serve
//! ```

pub mod boards;
pub mod config;
pub mod error;
pub mod markup;
pub mod mcp;
pub mod wiki;

pub use boards::{AzureBoardsClient, BoardsConnector};
pub use config::Config;
pub use error::{ConnectorError, ErrorKind, Result};
pub use wiki::ContentConnector;
