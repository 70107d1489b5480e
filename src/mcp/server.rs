//! Logical MCP server: method dispatch for one session.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use super::jsonrpc::{codes, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::tools::ToolRegistry;

/// Protocol revisions we can speak, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

/// Name and version reported in `initialize`.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "cineconcerts".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// MCP protocol handler bound to a set of tools.
pub struct McpServer {
    info: ServerInfo,
    tools: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(info: ServerInfo, tools: Arc<ToolRegistry>) -> Self {
        Self { info, tools }
    }

    /// Handle a JSON-RPC request
    pub async fn handle_request(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let id = Some(req.id);
        match req.method.as_str() {
            "initialize" => self.handle_initialize(id, req.params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": self.tools.list() })),
            "tools/call" => self.handle_tools_call(id, req.params).await,
            _ => JsonRpcResponse::error(
                id,
                codes::METHOD_NOT_FOUND,
                &format!("Method not found: {}", req.method),
            ),
        }
    }

    /// Notifications need no answer.
    pub fn handle_notification(&self, notification: &JsonRpcNotification) {
        debug!(method = %notification.method, "Notification received");
    }

    fn handle_initialize(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let requested = params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);

        let Some(requested) = requested else {
            return JsonRpcResponse::error(
                id,
                codes::INVALID_PARAMS,
                "Invalid params: protocolVersion is required",
            );
        };

        let version = SUPPORTED_PROTOCOL_VERSIONS
            .iter()
            .find(|v| **v == requested)
            .unwrap_or(&SUPPORTED_PROTOCOL_VERSIONS[0]);

        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": version,
                "capabilities": {
                    "tools": { "listChanged": false }
                },
                "serverInfo": {
                    "name": self.info.name,
                    "version": self.info.version
                }
            }),
        )
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params = match params {
            Some(p) => p,
            None => return JsonRpcResponse::error(id, codes::INVALID_PARAMS, "Missing params"),
        };

        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n,
            None => return JsonRpcResponse::error(id, codes::INVALID_PARAMS, "Missing tool name"),
        };

        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        debug!(tool = name, "Tool call");

        match self.tools.call(name, arguments).await {
            Ok(output) => JsonRpcResponse::success(id, output.to_result()),
            // Unknown tool and malformed arguments are both caller mistakes.
            Err(e) => JsonRpcResponse::error(id, codes::INVALID_PARAMS, &e.to_string()),
        }
    }
}
