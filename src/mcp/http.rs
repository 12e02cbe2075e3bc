//! Stateless HTTP transport: one JSON-RPC message per `POST /mcp`.

use super::server::McpServer;
use crate::boards::WorkItemApi;
use crate::error::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;

/// Build the MCP router.
pub fn router<A: WorkItemApi + 'static>(server: Arc<McpServer<A>>) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp::<A>))
        .with_state(server)
}

/// Listen on `addr` and serve MCP requests until the process exits.
pub async fn serve_http<A: WorkItemApi + 'static>(server: Arc<McpServer<A>>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("MCP server listening on http://{}/mcp", addr);

    axum::serve(listener, router(server)).await?;
    Ok(())
}

async fn handle_mcp<A: WorkItemApi + 'static>(
    State(server): State<Arc<McpServer<A>>>,
    body: String,
) -> Response {
    match server.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
