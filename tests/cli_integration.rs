//! CLI integration tests.
//!
//! These verify argument parsing and the layered configuration chain.

use std::ffi::OsString;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

use cineconcerts_mcp::cli::{parse_args_from, Args};
use cineconcerts_mcp::config::{Config, ConfigError};

fn args(args: &[&str]) -> Vec<OsString> {
    std::iter::once("cineconcerts-mcp")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect()
}

fn config_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

// ============================================================================
// CLI Argument Tests
// ============================================================================

#[test]
fn test_cli_defaults() {
    let result = parse_args_from(args(&[])).unwrap();

    assert!(result.host.is_none());
    assert!(result.port.is_none());
    assert!(result.config.is_none());
    assert!(result.max_sessions.is_none());
    assert!(result.session_ttl.is_none());
    assert!(!result.no_rate_limit);
}

#[test]
fn test_cli_full_options() {
    let result = parse_args_from(args(&[
        "-H",
        "0.0.0.0",
        "-p",
        "8080",
        "-l",
        "debug",
        "--endpoint",
        "/mcp",
        "--max-sessions",
        "10",
        "--session-ttl",
        "600",
        "--no-rate-limit",
    ]))
    .unwrap();

    assert_eq!(result.host.unwrap().to_string(), "0.0.0.0");
    assert_eq!(result.port, Some(8080));
    assert_eq!(result.log_level, Some("debug".to_string()));
    assert_eq!(result.endpoint.as_deref(), Some("/mcp"));
    assert_eq!(result.max_sessions, Some(10));
    assert_eq!(result.session_ttl, Some(600));
    assert!(result.no_rate_limit);
}

#[test]
fn test_cli_invalid_values() {
    assert!(parse_args_from(args(&["-p", "not-a-number"])).is_err());
    assert!(parse_args_from(args(&["-p", "70000"])).is_err());
    assert!(parse_args_from(args(&["-H", "not-an-ip"])).is_err());
    assert!(parse_args_from(args(&["--session-ttl", "-5"])).is_err());
    assert!(parse_args_from(args(&["--bogus"])).is_err());
}

// ============================================================================
// Configuration Loading Tests
// ============================================================================

#[test]
fn test_config_from_json_file() {
    let file = config_file(
        r#"{
        "server": {
            "host": "192.168.1.100",
            "port": 9000,
            "endpoint": "/mcp",
            "graceful_shutdown": false
        },
        "sessions": {
            "max_sessions": 2,
            "ttl_secs": 120,
            "sweep_interval_secs": 30
        },
        "rate_limit": {
            "enabled": true,
            "requests_per_window": 50,
            "window_secs": 30
        },
        "providers": {
            "algolia_app_id": "APPID",
            "algolia_api_key": "SEARCHKEY",
            "timeout_secs": 3
        },
        "logging": {
            "level": "debug"
        }
    }"#,
    );

    let config = Config::from_file(file.path()).unwrap();

    let server = config.to_server_config().unwrap();
    assert_eq!(server.bind_address(), "192.168.1.100:9000");
    assert_eq!(server.endpoint, "/mcp");
    assert!(!server.graceful_shutdown);

    let registry = config.registry_config().unwrap();
    assert_eq!(registry.max_sessions, 2);
    assert_eq!(registry.ttl, Duration::from_secs(120));
    assert_eq!(registry.sweep_interval, Duration::from_secs(30));

    let limits = config.rate_limit_config();
    assert_eq!(limits.max_requests, 50);
    assert_eq!(limits.window, Duration::from_secs(30));

    let algolia = config.algolia_config().unwrap();
    assert_eq!(algolia.app_id, "APPID");
    assert_eq!(algolia.index, "knack_events");
    assert_eq!(config.provider_timeout(), Duration::from_secs(3));
    assert_eq!(config.log_filter(), "debug");
}

#[test]
fn test_config_missing_file() {
    let args = Args {
        config: Some("/nonexistent/cineconcerts.json".into()),
        ..Args::default()
    };
    assert!(matches!(Config::load(&args), Err(ConfigError::Io(_))));
}

#[test]
fn test_config_priority_cli_over_file() {
    let file = config_file(
        r#"{
        "server": { "host": "10.0.0.1", "port": 5000, "endpoint": "/" },
        "sessions": { "max_sessions": 3 },
        "rate_limit": { "enabled": true }
    }"#,
    );

    let args = Args {
        host: Some("192.168.1.1".parse().unwrap()),
        port: Some(8080),
        config: Some(file.path().to_path_buf()),
        endpoint: Some("/mcp".to_string()),
        max_sessions: Some(7),
        no_rate_limit: true,
        ..Args::default()
    };

    let config = Config::load(&args).unwrap();

    assert_eq!(config.server.host, "192.168.1.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.endpoint, "/mcp");
    assert_eq!(config.sessions.max_sessions, 7);
    assert!(!config.rate_limit.enabled);
}

#[test]
fn test_config_env_over_file() {
    let file = config_file(r#"{ "server": { "port": 5000 }, "providers": { "algolia_index": "from_file" } }"#);

    let mut config = Config::from_file(file.path()).unwrap();
    config.apply_env_from(|key| match key {
        "PORT" => Some("6000".to_string()),
        "ALGOLIA_INDEX" => Some("from_env".to_string()),
        _ => None,
    });

    assert_eq!(config.server.port, 6000);
    assert_eq!(config.providers.algolia_index, "from_env");
}

#[test]
fn test_config_missing_credentials_is_error() {
    let config = Config::default();
    let err = config.algolia_config().unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredential(_)));
}

// ============================================================================
// Configuration Serialization Tests
// ============================================================================

#[test]
fn test_config_partial_deserialization() {
    let config: Config = serde_json::from_str(r#"{"sessions": {"ttl_secs": 60}}"#).unwrap();

    assert_eq!(config.sessions.ttl_secs, 60);
    assert_eq!(config.sessions.max_sessions, 100); // Default
    assert_eq!(config.server.port, 8421); // Default
    assert!(config.server.graceful_shutdown); // Default
}
