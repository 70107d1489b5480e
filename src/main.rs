//! cineconcerts-mcp binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use cineconcerts_mcp::api::{serve, AppState};
use cineconcerts_mcp::cli::{self, print_help, print_version};
use cineconcerts_mcp::config::Config;
use cineconcerts_mcp::providers::{http_client, AlgoliaClient, NominatimGeocoder};
use cineconcerts_mcp::security::RateLimiter;
use cineconcerts_mcp::{event_tools, logging, SessionRegistry};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Run with --help for usage.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_with_filter(Some(config.log_filter()));
    info!("cineconcerts-mcp v{}", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let server_config = config.to_server_config()?;
    let registry_config = config.registry_config()?;
    let algolia = config.algolia_config()?;

    let client = http_client(config.provider_timeout(), &config.providers.user_agent)?;
    let search = Arc::new(AlgoliaClient::new(client.clone(), &algolia));
    let geocoder = Arc::new(NominatimGeocoder::new(
        client,
        config.providers.geocoder_url.clone(),
    ));
    info!(index = %algolia.index, "Event search via {}", search.url());

    let registry = Arc::new(SessionRegistry::new(registry_config));
    let tools = Arc::new(event_tools(search, geocoder));
    let state = AppState::new(registry, tools)
        .with_rate_limiter(RateLimiter::new(config.rate_limit_config()));

    serve(server_config, state).await?;
    Ok(())
}
