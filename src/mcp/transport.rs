//! Per-session Streamable HTTP transport.
//!
//! The transport owns the session's protocol state (initialized or not,
//! open or closed), its optional server-to-client event stream and the
//! observers waiting for it to close.

use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::jsonrpc::{JsonRpcMessage, JsonRpcResponse};
use super::server::McpServer;
use crate::error::CineConcertsError;
use crate::session::{CloseObserver, SessionId, SessionTransport};
use crate::Result;

/// Buffer size of the server-to-client stream.
const STREAM_BUFFER: usize = 32;

/// Receiving half of a session's event stream.
///
/// Yields server-initiated messages and ends when the transport closes.
pub type EventStream = mpsc::Receiver<Value>;

#[derive(Default)]
struct TransportState {
    initialized: bool,
    closed: bool,
    stream: Option<mpsc::Sender<Value>>,
    observers: Vec<CloseObserver>,
}

/// Transport serving exactly one session.
pub struct McpTransport {
    session_id: SessionId,
    server: McpServer,
    state: Mutex<TransportState>,
}

impl McpTransport {
    pub fn new(session_id: SessionId, server: McpServer) -> Self {
        Self {
            session_id,
            server,
            state: Mutex::new(TransportState::default()),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().map(|s| s.initialized).unwrap_or(false)
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|s| s.closed).unwrap_or(true)
    }

    fn lock(&self) -> Result<MutexGuard<'_, TransportState>> {
        self.state.lock().map_err(|_| CineConcertsError::LockPoisoned)
    }

    /// Process one inbound JSON-RPC message.
    ///
    /// Requests produce `Some(response)`; notifications and client responses
    /// produce `None`. A failed `initialize` closes the transport.
    pub async fn handle_message(&self, message: Value) -> Result<Option<JsonRpcResponse>> {
        let message = JsonRpcMessage::parse(message)?;
        let is_initialize = message.method() == Some("initialize")
            && matches!(message, JsonRpcMessage::Request(_));

        {
            let state = self.lock()?;
            if state.closed {
                return Err(CineConcertsError::TransportClosed);
            }
            if is_initialize && state.initialized {
                return Err(CineConcertsError::InvalidRequest(
                    "Server already initialized".to_string(),
                ));
            }
            if !is_initialize && !state.initialized {
                return Err(CineConcertsError::NotInitialized);
            }
        }

        match message {
            JsonRpcMessage::Request(req) if is_initialize => {
                let response = self.server.handle_request(req).await;
                if response.is_error() {
                    warn!(session_id = %self.session_id, "Initialize failed; closing transport");
                    self.close()?;
                } else {
                    self.lock()?.initialized = true;
                    info!(session_id = %self.session_id, "Session initialized");
                }
                Ok(Some(response))
            }
            JsonRpcMessage::Request(req) => {
                debug!(session_id = %self.session_id, method = %req.method, "Request");
                Ok(Some(self.server.handle_request(req).await))
            }
            JsonRpcMessage::Notification(notification) => {
                self.server.handle_notification(&notification);
                Ok(None)
            }
            JsonRpcMessage::Response(_) => {
                debug!(session_id = %self.session_id, "Client response ignored");
                Ok(None)
            }
        }
    }

    /// Open the session's server-to-client stream.
    ///
    /// At most one stream is open per session; a stream whose client went
    /// away no longer counts.
    pub fn open_stream(&self) -> Result<EventStream> {
        let mut state = self.lock()?;
        if state.closed {
            return Err(CineConcertsError::TransportClosed);
        }
        if !state.initialized {
            return Err(CineConcertsError::NotInitialized);
        }
        if state.stream.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(CineConcertsError::StreamAlreadyOpen);
        }

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        state.stream = Some(tx);
        debug!(session_id = %self.session_id, "Event stream opened");
        Ok(rx)
    }
}

impl SessionTransport for McpTransport {
    fn close(&self) -> Result<()> {
        let observers = {
            let mut state = self.lock()?;
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            // Dropping the sender ends the client's stream.
            state.stream = None;
            std::mem::take(&mut state.observers)
        };

        debug!(session_id = %self.session_id, "Transport closed");
        for observer in observers {
            observer(&self.session_id);
        }
        Ok(())
    }

    fn on_close(&self, observer: CloseObserver) {
        match self.state.lock() {
            Ok(mut state) if !state.closed => {
                state.observers.push(observer);
                return;
            }
            _ => {}
        }
        observer(&self.session_id);
    }
}
