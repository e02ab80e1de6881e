//! Fairplay - Provably-Fair Outcome Engine
//!
//! Commit-reveal randomness for casino games. The operator publishes a hash of
//! a secret server seed before any bet, every outcome is derived from
//! `sha256("{server}-{client}-{nonce}")`, and once the seed is revealed anyone
//! can recompute each round.

pub mod api;
pub mod config;
pub mod errors;
pub mod games;
pub mod metrics;
pub mod seeds;
pub mod sequencer;
pub mod verifier;

pub use config::FairplayConfig;
pub use errors::{FairError, FairResult};
pub use games::types::{GameKind, Outcome, OutcomeRecord, RawOutput};
pub use seeds::{SeedRegistry, SeedState, ServerSeed};
pub use sequencer::{InMemoryOutcomeStore, OutcomeStore, SessionSequencer};
pub use verifier::{verify, verify_outcome, VerifyRequest};
