//! HTTP response bodies and error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::CineConcertsError;
use crate::mcp::{codes, JsonRpcResponse};

pub const AT_CAPACITY_MESSAGE: &str = "Server at capacity. Try again later.";
pub const NO_VALID_SESSION_MESSAGE: &str = "Bad Request: No valid session";
pub const NOT_INITIALIZED_MESSAGE: &str = "Bad Request: Server not initialized";
pub const STREAM_CONFLICT_MESSAGE: &str = "Conflict: Only one SSE stream is allowed per session";
pub const INVALID_SESSION_TEXT: &str = "Invalid or missing session ID";

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub server: &'static str,
    pub version: &'static str,
    pub active_sessions: usize,
    pub tools: Vec<String>,
}

impl HealthResponse {
    pub fn new(active_sessions: usize, tools: Vec<String>) -> Self {
        Self {
            status: "ok",
            server: "cineconcerts-mcp",
            version: env!("CARGO_PKG_VERSION"),
            active_sessions,
            tools,
        }
    }
}

/// JSON-RPC error envelope with a null id.
pub fn rpc_error(status: StatusCode, code: i32, message: &str) -> Response {
    (status, Json(JsonRpcResponse::error(None, code, message))).into_response()
}

/// Plain-text 400 for stream and delete requests without a live session.
pub fn invalid_session() -> Response {
    (StatusCode::BAD_REQUEST, INVALID_SESSION_TEXT).into_response()
}

/// Map a request failure onto its HTTP status and JSON-RPC error.
pub fn error_response(err: &CineConcertsError) -> Response {
    match err {
        CineConcertsError::CapacityExceeded { .. } => rpc_error(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::SERVER_ERROR,
            AT_CAPACITY_MESSAGE,
        ),
        CineConcertsError::SessionNotFound(_) | CineConcertsError::TransportClosed => rpc_error(
            StatusCode::BAD_REQUEST,
            codes::SERVER_ERROR,
            NO_VALID_SESSION_MESSAGE,
        ),
        CineConcertsError::NotInitialized => rpc_error(
            StatusCode::BAD_REQUEST,
            codes::SERVER_ERROR,
            NOT_INITIALIZED_MESSAGE,
        ),
        CineConcertsError::InvalidRequest(message) => rpc_error(
            StatusCode::BAD_REQUEST,
            codes::INVALID_REQUEST,
            &format!("Invalid Request: {}", message),
        ),
        CineConcertsError::StreamAlreadyOpen => rpc_error(
            StatusCode::CONFLICT,
            codes::SERVER_ERROR,
            STREAM_CONFLICT_MESSAGE,
        ),
        CineConcertsError::Json(e) => rpc_error(
            StatusCode::BAD_REQUEST,
            codes::PARSE_ERROR,
            &format!("Parse error: {}", e),
        ),
        other => {
            error!("Request failed: {}", other);
            rpc_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL_ERROR,
                "Internal server error",
            )
        }
    }
}
