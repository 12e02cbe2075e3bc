//! MCP (Model Context Protocol) server for AI assistant integration.

pub mod http;
pub mod server;
pub mod tools;

pub use http::serve_http;
pub use server::McpServer;
pub use tools::get_tools;
