//! Logging initialization and configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "cineconcerts_mcp=info";

/// Build the filter from a directive string (e.g. `debug` or
/// `cineconcerts_mcp=debug,tower_http=info`).
///
/// A bare level applies to this crate only, so dependency chatter stays quiet.
fn build_filter(directive: Option<&str>) -> EnvFilter {
    match directive {
        Some(level) if is_bare_level(level) => {
            EnvFilter::new(format!("cineconcerts_mcp={},tower_http={}", level, level))
        }
        Some(directives) => {
            EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

fn is_bare_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "error" | "warn" | "info" | "debug" | "trace" | "off"
    )
}

/// Initialize the logging system.
///
/// Uses the `RUST_LOG` environment variable for filtering. If not set,
/// defaults to `cineconcerts_mcp=info`.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init() {
    init_with_filter(None);
}

/// Initialize the logging system with an explicit filter directive,
/// typically `Config::log_filter()`.
///
/// # Panics
///
/// Panics if another tracing subscriber has already been set.
pub fn init_with_filter(directive: Option<&str>) {
    tracing_subscriber::registry()
        .with(build_filter(directive))
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

/// Try to initialize the logging system.
///
/// Returns `Ok(())` if successful, or `Err` if logging has already been
/// initialized.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(build_filter(None))
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}
