//! Fairplay API Server Binary
//!
//! Provably-fair outcome engine behind an HTTP API.

use clap::Parser;
use fairplay::{
    api::server::{init_tracing, ApiServer},
    config::FairplayConfig,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fairplay-api")]
#[command(about = "Provably-fair commit-reveal outcome server", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Start from the development preset instead of defaults
    #[arg(long, conflicts_with = "config")]
    dev: bool,

    /// Override API server host
    #[arg(long)]
    host: Option<String>,

    /// Override API server port
    #[arg(long)]
    port: Option<u16>,

    /// Override the seed registry state file
    #[arg(long)]
    state_path: Option<String>,

    /// Allowed CORS origins (comma-separated, use * for all)
    #[arg(long)]
    cors_origins: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => FairplayConfig::load_from_file(path)?,
        None if args.dev => FairplayConfig::development(),
        None => FairplayConfig::default(),
    };

    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(path) = args.state_path {
        config.registry.state_path = Some(path);
    }
    if let Some(origins) = args.cors_origins {
        config.api.allowed_origins = origins
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();
    }
    config.validate()?;

    init_tracing(config.monitoring.log_level);
    if let Some(path) = &args.config {
        info!("📄 Loaded configuration from {}", path);
    }

    let server = ApiServer::from_config(config)?;
    server.run().await
}
