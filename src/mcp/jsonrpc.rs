//! JSON-RPC 2.0 message types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CineConcertsError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Standard and server-defined error codes.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Server-defined: capacity, missing session, rate limit.
    pub const SERVER_ERROR: i32 = -32000;
}

/// JSON-RPC request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC notification (a request without an id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: &str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.to_string(),
                data: None,
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// One inbound message, classified.
#[derive(Debug, Clone)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    /// A client's answer to a server-initiated request.
    Response(Value),
}

impl JsonRpcMessage {
    /// Classify a decoded JSON value.
    pub fn parse(value: Value) -> Result<Self, CineConcertsError> {
        let obj = match &value {
            Value::Object(obj) => obj,
            Value::Array(_) => {
                return Err(CineConcertsError::InvalidRequest(
                    "batch requests are not supported".to_string(),
                ))
            }
            _ => {
                return Err(CineConcertsError::InvalidRequest(
                    "message must be a JSON object".to_string(),
                ))
            }
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err(CineConcertsError::InvalidRequest(
                "jsonrpc must be \"2.0\"".to_string(),
            ));
        }

        let has_id = obj.get("id").is_some_and(|id| !id.is_null());

        if obj.contains_key("method") {
            let invalid = |e: serde_json::Error| CineConcertsError::InvalidRequest(e.to_string());
            return if has_id {
                serde_json::from_value(value).map(Self::Request).map_err(invalid)
            } else {
                serde_json::from_value(value)
                    .map(Self::Notification)
                    .map_err(invalid)
            };
        }

        if has_id && (obj.contains_key("result") || obj.contains_key("error")) {
            return Ok(Self::Response(value));
        }

        Err(CineConcertsError::InvalidRequest(
            "not a JSON-RPC request, notification or response".to_string(),
        ))
    }

    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) => None,
        }
    }
}

/// Whether a raw payload is a well-formed MCP `initialize` request: an id,
/// and object params carrying a string `protocolVersion`.
pub fn is_initialize_request(value: &Value) -> bool {
    value.get("jsonrpc").and_then(Value::as_str) == Some(JSONRPC_VERSION)
        && value.get("method").and_then(Value::as_str) == Some("initialize")
        && value.get("id").is_some_and(|id| !id.is_null())
        && value
            .get("params")
            .and_then(|p| p.get("protocolVersion"))
            .is_some_and(Value::is_string)
}
