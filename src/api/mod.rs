//! HTTP layer for cineconcerts-mcp.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check with live session count
//! - `POST <endpoint>` - One JSON-RPC message; an id-less `initialize` opens a session
//! - `GET <endpoint>` - Server-to-client SSE stream for a session
//! - `DELETE <endpoint>` - Terminate a session
//!
//! The session travels in the `mcp-session-id` header. The endpoint path
//! defaults to `/`.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cineconcerts_mcp::api::{serve, AppState, ServerConfig};
//! use cineconcerts_mcp::session::{RegistryConfig, SessionRegistry};
//! use cineconcerts_mcp::tools::ToolRegistry;
//!
//! #[tokio::main]
//! async fn main() -> cineconcerts_mcp::Result<()> {
//!     let registry = Arc::new(SessionRegistry::new(RegistryConfig::default()));
//!     let state = AppState::new(registry, Arc::new(ToolRegistry::new()));
//!     serve(ServerConfig::new("127.0.0.1", 8421), state).await
//! }
//! ```

pub mod handlers;
pub mod router;
pub mod types;

pub use handlers::{AppState, KEEP_ALIVE_INTERVAL};
pub use router::{
    create_router, create_router_at, is_valid_endpoint, serve, ServerConfig, DEFAULT_ENDPOINT,
    HEALTH_PATH,
};
pub use types::HealthResponse;
