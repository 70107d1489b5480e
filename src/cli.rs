//! Command-line interface for cineconcerts-mcp.

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::api::is_valid_endpoint;

/// Command-line arguments.
///
/// Unset options leave the lower-priority sources (env, config file) alone.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Path of the MCP endpoint.
    pub endpoint: Option<String>,
    /// Maximum concurrently live sessions.
    pub max_sessions: Option<usize>,
    /// Session idle TTL in seconds.
    pub session_ttl: Option<u64>,
    /// Disable rate limiting.
    pub no_rate_limit: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                result.host = Some(parse_value(&mut parser, "host")?);
            }
            Short('p') | Long("port") => {
                result.port = Some(parse_value(&mut parser, "port")?);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Long("endpoint") => {
                let endpoint: String = parser.value()?.parse()?;
                if !is_valid_endpoint(&endpoint) {
                    return Err(ArgsError::InvalidValue("endpoint", endpoint));
                }
                result.endpoint = Some(endpoint);
            }
            Long("max-sessions") => {
                let max: usize = parse_value(&mut parser, "max-sessions")?;
                if max == 0 {
                    return Err(ArgsError::InvalidValue("max-sessions", max.to_string()));
                }
                result.max_sessions = Some(max);
            }
            Long("session-ttl") => {
                result.session_ttl = Some(parse_value(&mut parser, "session-ttl")?);
            }
            Long("no-rate-limit") => {
                result.no_rate_limit = true;
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

fn parse_value<T: std::str::FromStr>(
    parser: &mut lexopt::Parser,
    name: &'static str,
) -> Result<T, ArgsError> {
    use lexopt::ValueExt;

    let value: String = parser.value()?.parse()?;
    value
        .parse()
        .map_err(|_| ArgsError::InvalidValue(name, value))
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"cineconcerts-mcp {version}
MCP server for searching CineConcerts film-concert events

USAGE:
    cineconcerts-mcp [OPTIONS]

OPTIONS:
    -H, --host <ADDR>         Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>         Port to listen on [default: 8421]
    -c, --config <FILE>       Path to configuration file (JSON)
    -l, --log-level <LVL>     Log level (error, warn, info, debug, trace)
        --endpoint <PATH>     Path of the MCP endpoint [default: /]
        --max-sessions <N>    Maximum concurrent sessions [default: 100]
        --session-ttl <SECS>  Idle seconds before a session expires [default: 1800]
        --no-rate-limit       Disable rate limiting
    -h, --help                Print help
    -V, --version             Print version

ENVIRONMENT VARIABLES:
    HOST                      Host address (overrides config)
    PORT                      Port number (overrides config)
    ALGOLIA_APP_ID            Algolia application id (required)
    ALGOLIA_API_KEY           Algolia search API key (required)
    ALGOLIA_INDEX             Algolia index [default: knack_events]
    CINECONCERTS_LOG_LEVEL    Log level (overrides config)
    RUST_LOG                  Alternative log level setting

EXAMPLES:
    # Start with defaults (localhost:8421, endpoint /)
    ALGOLIA_APP_ID=... ALGOLIA_API_KEY=... cineconcerts-mcp

    # Serve on all interfaces under /mcp
    cineconcerts-mcp -H 0.0.0.0 -p 8080 --endpoint /mcp

    # Start with config file
    cineconcerts-mcp -c /etc/cineconcerts-mcp/config.json
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("cineconcerts-mcp {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
