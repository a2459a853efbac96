//! Request handling and the stdio loop.

use super::protocol::{error_codes, Request, Response};
use crate::dispatch::ActionExecutor;
use crate::Result;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "evm-agent-kit";

/// Exposes an executor's registry as MCP tools.
pub struct McpServer<C> {
    executor: ActionExecutor<C>,
    ctx: C,
}

impl<C: Send + Sync> McpServer<C> {
    pub fn new(executor: ActionExecutor<C>, ctx: C) -> Self {
        Self { executor, ctx }
    }

    /// Answer one request. Notifications yield `None`.
    pub async fn handle_request(&self, req: Request) -> Option<Response> {
        debug!(method = %req.method, "MCP request");
        if req.is_notification() {
            return None;
        }
        let id = req.id.clone().unwrap_or(Value::Null);

        let response = match req.method.as_str() {
            "initialize" => self.initialize(id, req.params.as_ref()),
            "ping" => Response::success(id, json!({})),
            "tools/list" => self.tools_list(id),
            "tools/call" => self.tools_call(id, req.params.as_ref()).await,
            other => Response::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        };
        Some(response)
    }

    /// Parse and answer one line of input.
    pub async fn handle_line(&self, line: &str) -> Option<Response> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                return Some(Response::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<Request>(value) {
            Ok(req) => self.handle_request(req).await,
            Err(e) => Some(Response::error(
                id,
                error_codes::INVALID_REQUEST,
                format!("Invalid request: {}", e),
            )),
        }
    }

    /// Serve newline-delimited JSON-RPC until `reader` is exhausted.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(line).await {
                let mut encoded = serde_json::to_vec(&response)?;
                encoded.push(b'\n');
                writer.write_all(&encoded).await?;
                writer.flush().await?;
            }
        }
        info!("MCP input closed, shutting down");
        Ok(())
    }

    pub async fn serve_stdio(&self) -> Result<()> {
        info!(tools = self.executor.registry().len(), "Serving MCP over stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    fn initialize(&self, id: Value, params: Option<&Value>) -> Response {
        let protocol_version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        Response::success(
            id,
            json!({
                "protocolVersion": protocol_version,
                "capabilities": {"tools": {"listChanged": false}},
                "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
            }),
        )
    }

    fn tools_list(&self, id: Value) -> Response {
        let tools: Vec<Value> = self
            .executor
            .registry()
            .tool_definitions()
            .iter()
            .map(|def| def.to_mcp_tool())
            .collect();
        Response::success(id, json!({ "tools": tools }))
    }

    async fn tools_call(&self, id: Value, params: Option<&Value>) -> Response {
        let Some(params) = params else {
            return Response::error(id, error_codes::INVALID_PARAMS, "Missing 'params' object");
        };
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Response::error(id, error_codes::INVALID_PARAMS, "Missing tool 'name'");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let envelope = self.executor.execute(&self.ctx, name, arguments).await;
        if envelope.is_error() {
            warn!(tool = name, "Tool call failed");
        }

        Response::success(
            id,
            json!({
                "content": [{"type": "text", "text": envelope.to_value().to_string()}],
                "isError": envelope.is_error(),
            }),
        )
    }
}
