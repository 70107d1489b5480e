//! MCP endpoint and health handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures_util::stream;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::types::{error_response, invalid_session, HealthResponse};
use crate::error::CineConcertsError;
use crate::mcp::{
    is_initialize_request, JsonRpcResponse, McpServer, McpTransport, ServerInfo,
    SESSION_ID_HEADER,
};
use crate::security::RateLimiter;
use crate::session::{Session, SessionId, SessionRegistry};
use crate::tools::ToolRegistry;
use crate::Result;

/// Interval between SSE keep-alive comments.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub tools: Arc<ToolRegistry>,
    pub limiter: Arc<RateLimiter>,
    pub server_info: ServerInfo,
}

impl AppState {
    /// State with the default rate limiter.
    pub fn new(registry: Arc<SessionRegistry>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            tools,
            limiter: Arc::new(RateLimiter::default()),
            server_info: ServerInfo::default(),
        }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Arc::new(limiter);
        self
    }

    /// Build the transport for a new session: a fresh logical server over
    /// the shared tools.
    fn new_transport(&self, id: SessionId) -> McpTransport {
        McpTransport::new(
            id,
            McpServer::new(self.server_info.clone(), Arc::clone(&self.tools)),
        )
    }

    /// Resolve the session named by the request header, if any.
    ///
    /// Malformed ids resolve to nothing, same as unknown ones.
    fn lookup(&self, headers: &HeaderMap) -> Result<Option<Session<McpTransport>>> {
        let Some(raw) = session_header(headers) else {
            return Ok(None);
        };
        match raw.parse::<SessionId>() {
            Ok(id) => self.registry.resolve(&id),
            Err(_) => {
                debug!(session_id = raw, "Malformed session id");
                Ok(None)
            }
        }
    }
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn with_session_header(mut response: Response, id: SessionId) -> Response {
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(SESSION_ID_HEADER, value);
    }
    response
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let tools = state.tools.names().into_iter().map(String::from).collect();
    Json(HealthResponse::new(state.registry.len(), tools))
}

/// `POST` on the MCP endpoint: one JSON-RPC message.
pub async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return error_response(&CineConcertsError::Json(e)),
    };

    let session = match state.lookup(&headers) {
        Ok(Some(session)) => {
            if let Err(e) = state.registry.touch(&session.id) {
                return error_response(&e);
            }
            session
        }
        Ok(None) if session_header(&headers).is_none() && is_initialize_request(&message) => {
            match state.registry.create(|id| state.new_transport(id)) {
                Ok(session) => session,
                Err(e) => {
                    warn!("Rejected new session: {}", e);
                    return error_response(&e);
                }
            }
        }
        Ok(None) => {
            let sid = session_header(&headers).unwrap_or_default().to_string();
            return error_response(&CineConcertsError::SessionNotFound(sid));
        }
        Err(e) => return error_response(&e),
    };

    let reply = into_response(session.transport.handle_message(message).await);
    if session.transport.is_closed() {
        return reply;
    }
    with_session_header(reply, session.id)
}

fn into_response(reply: Result<Option<JsonRpcResponse>>) -> Response {
    match reply {
        Ok(Some(response)) => Json(response).into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(&e),
    }
}

/// `GET` on the MCP endpoint: the session's server-to-client SSE stream.
pub async fn open_event_stream(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = match state.lookup(&headers) {
        Ok(Some(session)) => session,
        Ok(None) => return invalid_session(),
        Err(e) => return error_response(&e),
    };

    if let Err(e) = state.registry.touch(&session.id) {
        return error_response(&e);
    }

    let rx = match session.transport.open_stream() {
        Ok(rx) => rx,
        Err(e) => return error_response(&e),
    };
    debug!(session_id = %session.id, "SSE stream attached");

    let events = stream::unfold(rx, |mut rx| async move {
        let message = rx.recv().await?;
        let event = Event::default().event("message").json_data(&message);
        Some((event, rx))
    });

    let sse = Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL));
    with_session_header(sse.into_response(), session.id)
}

/// `DELETE` on the MCP endpoint: terminate the session.
pub async fn delete_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = match state.lookup(&headers) {
        Ok(Some(session)) => session,
        Ok(None) => return invalid_session(),
        Err(e) => return error_response(&e),
    };

    match state.registry.remove(&session.id) {
        Ok(_) => {
            info!(session_id = %session.id, "Session terminated by client");
            StatusCode::OK.into_response()
        }
        Err(e) => error_response(&e),
    }
}
