//! Relay Server
//!
//! Run with: cargo run --bin relay
//!
//! # Configuration
//!
//! Environment variables:
//! - `PORT`: Port to listen on (default: 3000)
//! - `RELAY_HOST`: Host to bind to (default: 0.0.0.0)
//! - `RELAY_STATIC_ROOT`: Directory to serve files from (default: .)
//! - `RELAY_INDEX_DOCUMENT`: Document served for `/` (default: public/index.html)
//! - `RELAY_MAX_CONNECTIONS`: WebSocket connection limit (default: unlimited)
//! - `RELAY_LOG_LEVEL` / `RELAY_LOG_FORMAT`: Logging (default: info / pretty)
//! - `RUST_LOG`: Full filter directive, overrides the log level

use anyhow::Context;
use clap::Parser;
use relay::config::{generate_default_config, Config, LogFormat, LoggingConfig};
use relay::server::{serve, AppState};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Relay JSON messages between WebSocket clients and serve static files.
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config and environment
    #[arg(short, long)]
    port: Option<u16>,

    /// Print a default config file to stdout and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let (mut config, source, load_errors) = match &cli.config {
        Some(path) => {
            let config = Config::load_with_env(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            (config, Some(path.clone()), Vec::new())
        }
        None => {
            let loaded = Config::load_default();
            (loaded.config, loaded.source, loaded.errors)
        }
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_tracing(&config.logging);

    for error in &load_errors {
        tracing::warn!("Ignoring config file: {}", error);
    }
    match &source {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::debug!("Using default config with environment overrides"),
    }

    tracing::info!("Starting relay v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Static root: {:?}", config.server.static_root);
    match config.hub.max_connections {
        Some(limit) => tracing::info!("Connection limit: {}", limit),
        None => tracing::info!("Connection limit: unlimited"),
    }

    let state = AppState::from_config(&config);
    serve(state, &config.server).await?;

    tracing::info!("Relay stopped");
    Ok(())
}

/// Initialize tracing from the logging config; `RUST_LOG` takes precedence
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("relay={},tower_http=debug", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
