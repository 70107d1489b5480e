//! Router assembly and the server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{HeaderName, StatusCode},
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use super::handlers::{delete_session, health, open_event_stream, post_message, AppState};
use super::types::rpc_error;
use crate::mcp::{codes, SESSION_ID_HEADER};
use crate::security::rate_limit_middleware;
use crate::session::{spawn_sweeper, SessionRegistry, SweeperHandle};

/// Default path of the MCP endpoint.
pub const DEFAULT_ENDPOINT: &str = "/";

/// Path of the health check.
pub const HEALTH_PATH: &str = "/health";

/// Whether `path` can serve as the MCP endpoint.
///
/// It must be absolute, must not collide with `/health` and must be a
/// literal path (no `{param}` captures).
pub fn is_valid_endpoint(path: &str) -> bool {
    path.starts_with('/') && path != HEALTH_PATH && !path.contains(['{', '}'])
}

/// Create the router with the MCP endpoint at `/`.
pub fn create_router(state: AppState) -> Router {
    create_router_at(state, DEFAULT_ENDPOINT)
}

/// Create the router with the MCP endpoint at `endpoint`.
///
/// Rate limiting applies to the MCP endpoint only; `/health` is exempt.
pub fn create_router_at(state: AppState, endpoint: &str) -> Router {
    let mcp = Router::new()
        .route(
            endpoint,
            post(post_message)
                .get(open_event_stream)
                .delete(delete_session),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.limiter),
            rate_limit_middleware,
        ));

    Router::new()
        .route(HEALTH_PATH, get(health))
        .merge(mcp)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([HeaderName::from_static(SESSION_ID_HEADER)]),
        )
        .with_state(state)
}

fn panic_response(panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);

    rpc_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        codes::INTERNAL_ERROR,
        "Internal server error",
    )
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Path of the MCP endpoint.
    pub endpoint: String,
    /// Drain in-flight requests on shutdown.
    pub graceful_shutdown: bool,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8421,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            graceful_shutdown: true,
        }
    }
}

/// Run the server until Ctrl-C or SIGTERM.
///
/// Starts the idle sweeper; on shutdown stops it and closes every session
/// before the listener finishes draining.
pub async fn serve(config: ServerConfig, state: AppState) -> crate::Result<()> {
    let addr = config.bind_address();
    let router = create_router_at(state.clone(), &config.endpoint);
    let listener = TcpListener::bind(&addr).await?;

    let limits = state.registry.config();
    info!(
        endpoint = %config.endpoint,
        max_sessions = limits.max_sessions,
        ttl_secs = limits.ttl.as_secs(),
        rate_limit = state.limiter.is_enabled(),
        "Starting CineConcerts MCP server on {}",
        addr
    );

    let sweeper = spawn_sweeper(Arc::clone(&state.registry), limits.sweep_interval);
    let on_shutdown = shutdown(Arc::clone(&state.registry), sweeper);
    let app = router.into_make_service_with_connect_info::<SocketAddr>();

    if config.graceful_shutdown {
        axum::serve(listener, app)
            .with_graceful_shutdown(on_shutdown)
            .await?;
    } else {
        tokio::select! {
            result = async { axum::serve(listener, app).await } => result?,
            _ = on_shutdown => {}
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown(registry: Arc<SessionRegistry>, sweeper: SweeperHandle) {
    shutdown_signal().await;
    info!("Shutdown signal received");

    sweeper.stop().await;
    match registry.close_all() {
        Ok(closed) => info!(closed, "Closed all sessions"),
        Err(e) => warn!("Failed to close sessions: {}", e),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
