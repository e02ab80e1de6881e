//! Request Handlers
//!
//! Thin adapters from HTTP to the seed registry, sequencer and verifier.

use super::{
    errors::ApiError,
    middleware::{bearer_token, tokens_match, RequestId},
    models::*,
};
use crate::{
    config::FairplayConfig,
    errors::FairError,
    games::{
        outcome::{generate_outcome, sha256_hex},
        types::{GameKind, GameResult, OutcomeRecord, PlayRequest},
        GameProcessor,
    },
    metrics::FairnessMetrics,
    seeds::{SeedRegistry, ServerSeed},
    sequencer::{EpochAudit, SessionSequencer},
    verifier::{self, VerifyRequest},
};
use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Shared application state
pub struct AppState {
    pub registry: Arc<SeedRegistry>,
    pub sequencer: Arc<SessionSequencer>,
    pub processor: GameProcessor,
    pub metrics: Arc<FairnessMetrics>,
    /// Bearer token for operator endpoints; reveal is disabled without one
    pub operator_token: Option<String>,
    pub version: String,
}

impl AppState {
    pub fn new(
        registry: Arc<SeedRegistry>,
        operator_token: Option<String>,
    ) -> Result<Self, prometheus::Error> {
        let sequencer = Arc::new(SessionSequencer::in_memory(registry.clone()));
        Ok(Self {
            processor: GameProcessor::new(sequencer.clone()),
            registry,
            sequencer,
            metrics: Arc::new(FairnessMetrics::new()?),
            operator_token,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Open the registry described by `config` and wire up the services
    pub fn from_config(config: &FairplayConfig) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;
        let registry = Arc::new(SeedRegistry::open(&config.registry)?);
        Ok(Self::new(registry, config.api.operator_token.clone())?)
    }

    fn fail(&self, request_id: &RequestId, err: FairError) -> ApiError {
        self.metrics.record_error(&err);
        ApiError::fair(request_id.0.clone(), err)
    }
}

/// Run a registry mutation, moving it to the blocking pool when it writes a snapshot
async fn registry_call<T, F>(registry: &Arc<SeedRegistry>, f: F) -> Result<T, FairError>
where
    F: FnOnce(&SeedRegistry) -> Result<T, FairError> + Send + 'static,
    T: Send + 'static,
{
    if !registry.is_persistent() {
        return f(registry.as_ref());
    }
    let registry = registry.clone();
    tokio::task::spawn_blocking(move || f(registry.as_ref()))
        .await
        .map_err(|e| FairError::Storage(format!("Registry task failed: {}", e)))?
}

/// Health check handler
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
    })
}

/// Commitment for the next bet
/// GET /fairness/commitment
pub async fn commitment_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<CommitmentResponse>, ApiError> {
    let seed = state
        .registry
        .active_server_seed()
        .ok_or_else(|| state.fail(&request_id, FairError::NoActiveSeed))?;

    Ok(Json(CommitmentResponse {
        epoch_index: seed.epoch_index,
        commitment: seed.hashed_value,
        client_seed: state.registry.client_seed(),
        next_nonce: state.sequencer.next_nonce(seed.epoch_index),
    }))
}

/// Public seed history, oldest first
/// GET /fairness/seeds
pub async fn seeds_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ServerSeed>> {
    Json(state.registry.history())
}

/// Replace the client seed
/// PUT /fairness/client-seed
pub async fn set_client_seed_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClientSeedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let value = request.value;
    let seed = registry_call(&state.registry, move |registry| registry.set_client_seed(&value))
        .await
        .map_err(|e| state.fail(&request_id, e))?;

    info!(request_id = %request_id.0, "Client seed replaced");
    Ok(Json(seed))
}

/// Place a bet
/// POST /games/:kind/play
pub async fn play_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(request): Json<PlayRequest>,
) -> Result<Json<GameResult>, ApiError> {
    let kind: GameKind = kind.parse().map_err(|e| state.fail(&request_id, e))?;
    if request.selection.kind() != kind {
        return Err(ApiError::bad_request(
            request_id.0,
            format!(
                "selection is for {} but the route is {}",
                request.selection.kind(),
                kind
            ),
        ));
    }

    let result = state
        .processor
        .play(request)
        .map_err(|e| state.fail(&request_id, e))?;
    state.metrics.record_bet(kind);

    info!(
        request_id = %request_id.0,
        game = %kind,
        epoch = result.record.epoch_index,
        nonce = result.record.nonce,
        outcome = ?result.outcome,
        "Bet settled"
    );
    Ok(Json(result))
}

/// Look up a recorded outcome
/// GET /records/:id
pub async fn record_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OutcomeRecord>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| {
        ApiError::bad_request(request_id.0.clone(), format!("Invalid record id: {}", id))
    })?;

    state
        .sequencer
        .record(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(request_id.0, format!("Record {} not found", id)))
}

/// Reveal an epoch's server seed and audit its records
/// POST /fairness/reveal
pub async fn reveal_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<RevealRequest>,
) -> Result<Json<RevealResponse>, ApiError> {
    let Some(expected) = state.operator_token.as_deref() else {
        return Err(ApiError::service_unavailable(
            request_id.0,
            "No operator token configured".to_string(),
        ));
    };
    match bearer_token(&headers) {
        Some(provided) if tokens_match(expected, provided) => {}
        _ => {
            warn!(request_id = %request_id.0, "Rejected reveal with bad operator token");
            return Err(ApiError::unauthorized(
                request_id.0,
                "Missing or invalid operator token".to_string(),
            ));
        }
    }

    let epoch_index = request.epoch_index;
    let plaintext = request.plaintext;
    let receipt = registry_call(&state.registry, move |registry| match &plaintext {
        Some(plaintext) => registry.reveal_and_rotate(epoch_index, plaintext),
        None => registry.reveal_held_seed(epoch_index),
    })
    .await
    .map_err(|e| state.fail(&request_id, e))?;

    if receipt.next_commitment.is_some() {
        state.metrics.record_rotation();
    }

    let audit: EpochAudit = state
        .sequencer
        .audit_epoch(epoch_index)
        .map_err(|e| state.fail(&request_id, e))?;

    Ok(Json(RevealResponse { receipt, audit }))
}

/// Verify a past round from its revealed inputs
/// POST /fairness/verify
///
/// A recomputation that disagrees with the claim is reported in the body with
/// `is_valid: false`; malformed input and wrong seeds are request errors.
pub async fn verify_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyApiRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let claimed_outcome = request
        .claimed_text()
        .map_err(|msg| state.fail(&request_id, FairError::InvalidInput(msg)))?;

    let verify_request = VerifyRequest {
        game_kind: request.game_kind,
        server_seed: request.server_seed,
        client_seed: request.client_seed,
        nonce: request.nonce,
        claimed_outcome,
        commitment: request.commitment,
    };

    match verifier::verify(&verify_request) {
        Ok(verification) => {
            state.metrics.record_verification(true);
            Ok(Json(VerifyResponse {
                is_valid: true,
                error_code: None,
                error: None,
                computed_outcome: Some(verification.outcome),
                commitment: verification.commitment,
                digest: verification.raw_output.digest_hex,
            }))
        }
        Err(err @ FairError::FairnessViolation { .. }) => {
            // Counted as an invalid verification only; the alarm is for stored records
            state.metrics.record_verification(false);

            let (raw_output, outcome) = generate_outcome(
                verify_request.game_kind,
                &verify_request.server_seed,
                &verify_request.client_seed,
                verify_request.nonce,
            );
            Ok(Json(VerifyResponse {
                is_valid: false,
                error_code: Some(err.code().to_string()),
                error: Some(err.to_string()),
                computed_outcome: Some(outcome),
                commitment: sha256_hex(&verify_request.server_seed),
                digest: raw_output.digest_hex,
            }))
        }
        Err(err) => {
            state.metrics.record_verification(false);
            Err(state.fail(&request_id, err))
        }
    }
}

/// Audit a revealed epoch
/// GET /fairness/audit/:epoch
pub async fn audit_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(epoch_index): Path<u64>,
) -> Result<Json<EpochAudit>, ApiError> {
    state
        .sequencer
        .audit_epoch(epoch_index)
        .map(Json)
        .map_err(|e| state.fail(&request_id, e))
}

/// Prometheus scrape endpoint
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
