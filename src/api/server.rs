//! API Server
//!
//! Builds the middleware stack around the router and serves it until a
//! shutdown signal arrives.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::config::{FairplayConfig, LogLevel};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

/// HTTP front end for the fairness engine
pub struct ApiServer {
    config: FairplayConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: FairplayConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Open the registry from configuration and build the server
    pub fn from_config(config: FairplayConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let state = Arc::new(AppState::from_config(&config)?);
        Ok(Self::new(config, state))
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Start the API server
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = create_app(self.state.clone(), &self.config);
        let addr = self.socket_addr()?;

        info!("🎲 Starting Fairplay API Server");
        info!("   Listen: http://{}", addr);
        self.log_server_info();

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("🛑 API Server stopped gracefully");
        Ok(())
    }

    fn socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.config.api.host.parse::<std::net::IpAddr>()?,
            self.config.api.port,
        )))
    }

    fn log_server_info(&self) {
        info!("📋 Server Configuration:");
        info!("   Version: {}", self.state.version);
        info!("   CORS: {:?}", self.config.api.allowed_origins);
        info!("   Request timeout: {}s", self.config.api.request_timeout_secs);
        info!("   Metrics enabled: {}", self.config.monitoring.enable_metrics);
        match &self.config.registry.state_path {
            Some(path) => info!("   Seed registry: {}", path),
            None => warn!("   Seed registry is in-memory; history is lost on restart"),
        }
        if self.state.operator_token.is_none() {
            warn!("   No operator token configured; /fairness/reveal is disabled");
        }
        match self.state.registry.active_server_seed() {
            Some(seed) => info!(
                "   Active commitment: epoch {} {}",
                seed.epoch_index, seed.hashed_value
            ),
            None => warn!("   No active server seed; bets are refused until one is committed"),
        }
    }
}

/// Router plus the middleware stack, without binding a socket
pub fn create_app(state: Arc<AppState>, config: &FairplayConfig) -> axum::Router {
    // Outermost first
    create_router(state, config.monitoring.enable_metrics).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(config.request_timeout()))
            .layer(create_cors_layer(config.api.allowed_origins.clone()))
            .layer(axum::middleware::from_fn(request_id_middleware)),
    )
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(level: LogLevel) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("fairplay={},tower_http=info", level.as_filter()).into()
    });
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        warn!("Tracing subscriber already installed");
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
