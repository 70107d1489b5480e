//! # cineconcerts-mcp
//!
//! Model Context Protocol server exposing read-only search over CineConcerts
//! film-concert events.
//!
//! Clients speak MCP's Streamable HTTP transport: each `initialize` without
//! a session id opens a session, later requests carry the id in the
//! `mcp-session-id` header. Sessions are bounded in number, expire when idle
//! and are closed on shutdown.
//!
//! ## Features
//!
//! - **Session registry**: capacity limit, idle sweep, close notifications
//! - **Four query tools**: text search, nearby search, upcoming listing, show details
//! - **Providers**: Algolia event index and Nominatim geocoding over `reqwest`
//! - **Rate limiting**: per-client sliding window on the MCP endpoint
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use cineconcerts_mcp::api::{serve, AppState, ServerConfig};
//! use cineconcerts_mcp::providers::{http_client, AlgoliaClient, AlgoliaConfig, NominatimGeocoder};
//! use cineconcerts_mcp::session::{RegistryConfig, SessionRegistry};
//! use cineconcerts_mcp::tools::event_tools;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     cineconcerts_mcp::logging::try_init().ok();
//!
//!     let client = http_client(Duration::from_secs(10), "CineConcerts-MCP/1.0")?;
//!     let algolia = AlgoliaConfig {
//!         app_id: "APP_ID".into(),
//!         api_key: "SEARCH_KEY".into(),
//!         index: "knack_events".into(),
//!         host: None,
//!     };
//!     let search = Arc::new(AlgoliaClient::new(client.clone(), &algolia));
//!     let geocoder = Arc::new(NominatimGeocoder::new(
//!         client,
//!         cineconcerts_mcp::providers::DEFAULT_GEOCODER_URL,
//!     ));
//!
//!     let registry = Arc::new(SessionRegistry::new(RegistryConfig::default()));
//!     let state = AppState::new(registry, Arc::new(event_tools(search, geocoder)));
//!     serve(ServerConfig::default(), state).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod providers;
pub mod security;
pub mod session;
pub mod tools;

// Re-export commonly used types
pub use error::{CineConcertsError, Result};
pub use mcp::{McpServer, McpTransport, ServerInfo};
pub use session::{RegistryConfig, Session, SessionId, SessionRegistry};
pub use tools::{event_tools, ToolRegistry};
