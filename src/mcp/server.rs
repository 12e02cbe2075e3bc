//! MCP JSON-RPC 2.0 server.

use crate::boards::{AzureBoardsClient, BoardsConnector, WorkItemApi, WorkItemType};
use crate::config::Config;
use crate::error::{ConnectorError, Result};
use crate::wiki::{ContentConnector, DEFAULT_LIMIT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;
const CONNECTOR_ERROR: i32 = -32000;

/// MCP server exposing the board and wiki connectors as tools.
pub struct McpServer<A = AzureBoardsClient> {
    boards: BoardsConnector<A>,
    wiki: ContentConnector,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    _jsonrpc: String,
    id: Option<serde_json::Value>,
    method: String,
    #[serde(default)]
    params: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<ConnectorError> for JsonRpcError {
    fn from(e: ConnectorError) -> Self {
        Self {
            code: CONNECTOR_ERROR,
            message: e.to_string(),
            data: Some(serde_json::json!({
                "kind": e.kind(),
                "status": e.status(),
                "body": e.body(),
            })),
        }
    }
}

impl JsonRpcResponse {
    fn reply(id: Option<serde_json::Value>, outcome: RpcResult) -> Self {
        match outcome {
            Ok(value) => Self {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(value),
                error: None,
            },
            Err(error) => Self {
                jsonrpc: "2.0".to_string(),
                id,
                result: None,
                error: Some(error),
            },
        }
    }

    pub fn parse_error(e: impl std::fmt::Display) -> Self {
        Self::reply(
            None,
            Err(JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", e))),
        )
    }
}

type RpcResult = std::result::Result<serde_json::Value, JsonRpcError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskIdArgs {
    task_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParentIdArgs {
    parent_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskTypeArgs {
    task_type: WorkItemType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageIdArgs {
    page_id: String,
}

#[derive(Debug, Deserialize)]
struct CqlArgs {
    cql: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePageArgs {
    space_key: String,
    title: String,
    content: String,
    #[serde(default)]
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePageArgs {
    page_id: String,
    title: String,
    content: String,
}

fn parse_args<T: DeserializeOwned>(arguments: serde_json::Value) -> std::result::Result<T, JsonRpcError> {
    serde_json::from_value(arguments)
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Invalid arguments: {}", e)))
}

/// Tool result: a pretty JSON text echo of `value`, plus the value itself as
/// structured content, wrapped under `key` when one is given.
fn tool_result<T: Serialize>(prefix: &str, key: Option<&str>, value: &T) -> RpcResult {
    let value = serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))?;
    let text = serde_json::to_string_pretty(&value)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))?;

    let structured = match key {
        Some(key) => {
            let mut wrapper = serde_json::Map::new();
            wrapper.insert(key.to_string(), value);
            serde_json::Value::Object(wrapper)
        }
        None => value,
    };

    Ok(serde_json::json!({
        "content": [{
            "type": "text",
            "text": format!("{}{}", prefix, text)
        }],
        "structuredContent": structured
    }))
}

impl McpServer {
    /// Build both connectors from validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            BoardsConnector::new(AzureBoardsClient::new(&config.boards)?),
            ContentConnector::new(&config.wiki)?,
        ))
    }
}

impl<A: WorkItemApi> McpServer<A> {
    pub fn new(boards: BoardsConnector<A>, wiki: ContentConnector) -> Self {
        Self { boards, wiki }
    }

    /// Run the MCP server over stdio.
    pub async fn run(&self) -> Result<()> {
        tracing::info!("boardwiki MCP server started on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve newline-delimited JSON-RPC messages until `reader` closes.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.split(b'\n');

        while let Some(raw) = lines.next_segment().await? {
            let line = match String::from_utf8(raw) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Skipping non UTF-8 input line: {}", e);
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(&line).await {
                let mut frame = serde_json::to_string(&response)?;
                frame.push('\n');
                writer.write_all(frame.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle one raw JSON-RPC message. Notifications produce no response.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Unparseable request: {}", e);
                return Some(JsonRpcResponse::parse_error(e));
            }
        };

        if request.id.is_none() || request.method.starts_with("notifications/") {
            tracing::debug!("Notification {}", request.method);
            return None;
        }

        Some(self.handle_request(request).await)
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params).await,
            _ => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            )),
        };

        JsonRpcResponse::reply(request.id, result)
    }

    fn handle_initialize(&self) -> RpcResult {
        Ok(serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "boardwiki",
                "version": env!("CARGO_PKG_VERSION")
            }
        }))
    }

    fn handle_tools_list(&self) -> RpcResult {
        let tools = super::tools::get_tools();
        Ok(serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, params: serde_json::Value) -> RpcResult {
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "Missing tool name"))?;

        let arguments = params
            .get("arguments")
            .cloned()
            .filter(|v| !v.is_null())
            .unwrap_or(serde_json::json!({}));

        tracing::info!("Tool call: {}", name);

        match name {
            "getTasks" => {
                let tasks = self.boards.list_active_tasks().await?;
                tool_result("", Some("tasks"), &tasks)
            }
            "getTaskDescription" => {
                let args: TaskIdArgs = parse_args(arguments)?;
                let detail = self.boards.get_task_detail(args.task_id).await?;
                tool_result("", None, &detail)
            }
            "getChildTasks" => {
                let args: ParentIdArgs = parse_args(arguments)?;
                let children = self.boards.get_child_tasks(args.parent_id).await?;
                tool_result("", Some("childTasks"), &children)
            }
            "countAllTasks" => {
                let count = self.boards.count_tasks().await?;
                tool_result("", None, &serde_json::json!({ "count": count }))
            }
            "getTasksByType" => {
                let args: TaskTypeArgs = parse_args(arguments)?;
                let tasks = self.boards.get_tasks_by_type(args.task_type).await?;
                tool_result("", Some("tasks"), &tasks)
            }
            "get_page" => {
                let args: PageIdArgs = parse_args(arguments)?;
                let page = self.wiki.get_page(&args.page_id, None).await?;
                tool_result("", Some("page"), &page)
            }
            "search_confluence" => {
                let args: CqlArgs = parse_args(arguments)?;
                let results = self.wiki.search(&args.cql, DEFAULT_LIMIT).await?;
                tool_result("", Some("results"), &results)
            }
            "list_spaces" => {
                let spaces = self.wiki.list_spaces(DEFAULT_LIMIT).await?;
                tool_result("", Some("spaces"), &spaces)
            }
            "create_page" => {
                let args: CreatePageArgs = parse_args(arguments)?;
                let page = self
                    .wiki
                    .create_page(
                        &args.space_key,
                        &args.title,
                        &args.content,
                        args.parent_id.as_deref(),
                    )
                    .await?;
                tool_result("Page created: ", Some("page"), &page)
            }
            "update_page" => {
                let args: UpdatePageArgs = parse_args(arguments)?;
                let page = self
                    .wiki
                    .update_page(&args.page_id, &args.title, &args.content)
                    .await?;
                tool_result("Page updated: ", Some("page"), &page)
            }
            _ => Err(JsonRpcError::new(
                INVALID_PARAMS,
                format!("Unknown tool: {}", name),
            )),
        }
    }
}
