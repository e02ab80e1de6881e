//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>, enable_metrics: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))

        // Public fairness endpoints
        .route("/fairness/commitment", get(commitment_handler))
        .route("/fairness/seeds", get(seeds_handler))
        .route("/fairness/client-seed", put(set_client_seed_handler))
        .route("/fairness/verify", post(verify_handler))
        .route("/fairness/audit/:epoch", get(audit_handler))

        // Operator only
        .route("/fairness/reveal", post(reveal_handler))

        // Games
        .route("/games/:kind/play", post(play_handler))
        .route("/records/:id", get(record_handler));

    // Metrics endpoint for Prometheus
    let router = if enable_metrics {
        router.route("/metrics", get(metrics_handler))
    } else {
        router
    };

    router.with_state(state)
}
