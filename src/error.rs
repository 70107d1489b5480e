//! Error types for cineconcerts-mcp.

use thiserror::Error;

use crate::providers::ProviderError;

/// Main error type for cineconcerts-mcp operations.
#[derive(Error, Debug)]
pub enum CineConcertsError {
    /// Session with the given ID was not found.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The registry already holds the maximum number of live sessions.
    #[error("server at capacity: {max} sessions")]
    CapacityExceeded { max: usize },

    /// The session's transport has been closed.
    #[error("transport closed")]
    TransportClosed,

    /// A non-initialize message arrived before the initialize handshake.
    #[error("server not initialized")]
    NotInitialized,

    /// The message is not a valid JSON-RPC 2.0 message for this endpoint.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A server-to-client event stream is already open for the session.
    #[error("event stream already open")]
    StreamAlreadyOpen,

    /// External provider failure.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,
}

/// Convenience Result type for cineconcerts-mcp operations.
pub type Result<T> = std::result::Result<T, CineConcertsError>;
