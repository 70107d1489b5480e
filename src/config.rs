//! Configuration management for cineconcerts-mcp.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::{is_valid_endpoint, ServerConfig};
use crate::cli::Args;
use crate::providers::{AlgoliaConfig, DEFAULT_GEOCODER_URL};
use crate::security::RateLimitConfig;
use crate::session::RegistryConfig;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub sessions: SessionsSection,
    pub rate_limit: RateLimitSection,
    pub providers: ProvidersSection,
    pub logging: LoggingSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Path of the MCP endpoint.
    pub endpoint: String,
    /// Enable graceful shutdown.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8421,
            endpoint: "/".to_string(),
            graceful_shutdown: true,
        }
    }
}

/// Session limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsSection {
    /// Maximum concurrently live sessions.
    pub max_sessions: usize,
    /// Idle seconds before a session is swept.
    pub ttl_secs: u64,
    /// Seconds between sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for SessionsSection {
    fn default() -> Self {
        Self {
            max_sessions: 100,
            ttl_secs: 30 * 60,
            sweep_interval_secs: 5 * 60,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    /// Enable rate limiting.
    pub enabled: bool,
    /// Requests per window.
    pub requests_per_window: u32,
    /// Window size in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_window: 60,
            window_secs: 60,
        }
    }
}

/// Event search and geocoding providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersSection {
    pub algolia_app_id: Option<String>,
    pub algolia_api_key: Option<String>,
    pub algolia_index: String,
    pub geocoder_url: String,
    /// User-Agent sent to both providers (Nominatim requires one).
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProvidersSection {
    fn default() -> Self {
        Self {
            algolia_app_id: None,
            algolia_api_key: None,
            algolia_index: "knack_events".to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            user_agent: "CineConcerts-MCP/1.0 (events@cineconcerts.com)".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = var("HOST") {
            self.server.host = host;
        }

        if let Some(port) = var("PORT") {
            if let Ok(port) = port.trim().parse() {
                self.server.port = port;
            }
        }

        if let Some(app_id) = var("ALGOLIA_APP_ID") {
            self.providers.algolia_app_id = Some(app_id);
        }

        if let Some(api_key) = var("ALGOLIA_API_KEY") {
            self.providers.algolia_api_key = Some(api_key);
        }

        if let Some(index) = var("ALGOLIA_INDEX") {
            self.providers.algolia_index = index;
        }

        if let Some(level) = var("CINECONCERTS_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }

        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref endpoint) = args.endpoint {
            self.server.endpoint = endpoint.clone();
        }

        if let Some(max) = args.max_sessions {
            self.sessions.max_sessions = max;
        }

        if let Some(ttl) = args.session_ttl {
            self.sessions.ttl_secs = ttl;
        }

        if args.no_rate_limit {
            self.rate_limit.enabled = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to ServerConfig for the HTTP server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        if !is_valid_endpoint(&self.server.endpoint) {
            return Err(ConfigError::InvalidValue(
                "server.endpoint",
                self.server.endpoint.clone(),
            ));
        }

        let mut server_config =
            ServerConfig::new(host.to_string(), self.server.port).with_endpoint(&self.server.endpoint);
        server_config.graceful_shutdown = self.server.graceful_shutdown;

        Ok(server_config)
    }

    /// Session registry limits.
    pub fn registry_config(&self) -> Result<RegistryConfig, ConfigError> {
        if self.sessions.max_sessions == 0 {
            return Err(ConfigError::InvalidValue("sessions.max_sessions", "0".into()));
        }
        if self.sessions.ttl_secs == 0 {
            return Err(ConfigError::InvalidValue("sessions.ttl_secs", "0".into()));
        }
        if self.sessions.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "sessions.sweep_interval_secs",
                "0".into(),
            ));
        }

        Ok(RegistryConfig {
            max_sessions: self.sessions.max_sessions,
            ttl: Duration::from_secs(self.sessions.ttl_secs),
            sweep_interval: Duration::from_secs(self.sessions.sweep_interval_secs),
        })
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            enabled: self.rate_limit.enabled,
            max_requests: self.rate_limit.requests_per_window,
            window: Duration::from_secs(self.rate_limit.window_secs),
            ..RateLimitConfig::default()
        }
    }

    /// Algolia settings; both credentials are required.
    pub fn algolia_config(&self) -> Result<AlgoliaConfig, ConfigError> {
        let app_id = self
            .providers
            .algolia_app_id
            .clone()
            .ok_or(ConfigError::MissingCredential("ALGOLIA_APP_ID"))?;
        let api_key = self
            .providers
            .algolia_api_key
            .clone()
            .ok_or(ConfigError::MissingCredential("ALGOLIA_API_KEY"))?;

        Ok(AlgoliaConfig {
            app_id,
            api_key,
            index: self.providers.algolia_index.clone(),
            host: None,
        })
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.providers.timeout_secs.max(1))
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// Out-of-range or malformed setting.
    InvalidValue(&'static str, String),
    /// Required provider credential not set.
    MissingCredential(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::InvalidValue(name, value) => write!(f, "invalid value for {}: '{}'", name, value),
            Self::MissingCredential(var) => {
                write!(f, "missing Algolia credentials: set {}", var)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
