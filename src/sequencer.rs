//! Per-wager nonce assignment and outcome recording.
//!
//! Nonces are scoped per server-seed epoch and start at 0. The nonce is
//! reserved, the outcome generated and the record stored while the registry's
//! read lock is held, so a reveal or rotation waits for in-flight bets.

use crate::errors::{FairError, FairResult};
use crate::games::outcome::generate_outcome;
use crate::games::types::{GameKind, OutcomeRecord};
use crate::seeds::SeedRegistry;
use crate::verifier::verify_record;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{debug, info};
use uuid::Uuid;

/// Persistence collaborator for outcome records
pub trait OutcomeStore: Send + Sync {
    fn store(&self, record: OutcomeRecord) -> FairResult<()>;

    fn get(&self, id: &Uuid) -> Option<OutcomeRecord>;

    /// Records for one epoch, ordered by nonce
    fn by_epoch(&self, epoch_index: u64) -> Vec<OutcomeRecord>;
}

/// Thread-safe in-memory record store
#[derive(Default)]
pub struct InMemoryOutcomeStore {
    records: DashMap<Uuid, OutcomeRecord>,
    epochs: DashMap<u64, Vec<Uuid>>,
}

impl InMemoryOutcomeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl OutcomeStore for InMemoryOutcomeStore {
    fn store(&self, record: OutcomeRecord) -> FairResult<()> {
        if self.records.contains_key(&record.id) {
            return Err(FairError::Storage(format!("duplicate record id {}", record.id)));
        }
        self.epochs.entry(record.epoch_index).or_default().push(record.id);
        self.records.insert(record.id, record);
        Ok(())
    }

    fn get(&self, id: &Uuid) -> Option<OutcomeRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    fn by_epoch(&self, epoch_index: u64) -> Vec<OutcomeRecord> {
        let ids = self
            .epochs
            .get(&epoch_index)
            .map(|ids| ids.value().clone())
            .unwrap_or_default();
        let mut records: Vec<_> = ids.iter().filter_map(|id| self.get(id)).collect();
        records.sort_by_key(|r| r.nonce);
        records
    }
}

/// Summary of a completed epoch audit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpochAudit {
    pub epoch_index: u64,
    pub commitment: String,
    pub records_verified: usize,
}

/// Assigns nonces and records the outcome of every wager
pub struct SessionSequencer {
    registry: Arc<SeedRegistry>,
    store: Arc<dyn OutcomeStore>,
    nonces: DashMap<u64, AtomicU64>,
}

impl SessionSequencer {
    pub fn new(registry: Arc<SeedRegistry>, store: Arc<dyn OutcomeStore>) -> Self {
        Self {
            registry,
            store,
            nonces: DashMap::new(),
        }
    }

    /// Sequencer backed by an [`InMemoryOutcomeStore`]
    pub fn in_memory(registry: Arc<SeedRegistry>) -> Self {
        Self::new(registry, Arc::new(InMemoryOutcomeStore::new()))
    }

    pub fn registry(&self) -> &Arc<SeedRegistry> {
        &self.registry
    }

    /// Generate and record one outcome against the active seed.
    ///
    /// Fails with `NoActiveSeed` rather than committing a seed inline.
    pub fn place_bet(&self, kind: GameKind) -> FairResult<OutcomeRecord> {
        let record = self.registry.with_active_seed(|seed| {
            let nonce = self.reserve_nonce(seed.epoch_index);
            let (raw_output, interpreted_outcome) =
                generate_outcome(kind, seed.server_seed, seed.client_seed, nonce);

            let record = OutcomeRecord {
                id: Uuid::new_v4(),
                game_kind: kind,
                server_seed_ref: seed.hashed_value.to_string(),
                epoch_index: seed.epoch_index,
                client_seed_value: seed.client_seed.to_string(),
                nonce,
                raw_output,
                interpreted_outcome,
                created_at: Utc::now(),
            };
            self.store.store(record.clone())?;
            Ok::<_, FairError>(record)
        })??;

        debug!(
            game = %kind,
            epoch = record.epoch_index,
            nonce = record.nonce,
            outcome = %record.interpreted_outcome,
            "Recorded outcome"
        );
        Ok(record)
    }

    /// Nonce the next bet against `epoch_index` will receive
    pub fn next_nonce(&self, epoch_index: u64) -> u64 {
        self.nonces
            .get(&epoch_index)
            .map(|n| n.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn record(&self, id: &Uuid) -> Option<OutcomeRecord> {
        self.store.get(id)
    }

    pub fn records_for_epoch(&self, epoch_index: u64) -> Vec<OutcomeRecord> {
        self.store.by_epoch(epoch_index)
    }

    /// Re-verify every stored record of a revealed epoch
    pub fn audit_epoch(&self, epoch_index: u64) -> FairResult<EpochAudit> {
        let seed = self.registry.seed(epoch_index).ok_or(FairError::SeedNotFound {
            epoch_index,
            history_len: self.registry.history().len(),
        })?;
        let revealed = seed.revealed_value.as_deref().ok_or_else(|| {
            FairError::invalid(format!("epoch {} has not been revealed", epoch_index))
        })?;

        let records = self.records_for_epoch(epoch_index);
        for record in &records {
            verify_record(record, revealed)?;
        }

        info!(epoch = epoch_index, records = records.len(), "Epoch audit passed");
        Ok(EpochAudit {
            epoch_index,
            commitment: seed.hashed_value,
            records_verified: records.len(),
        })
    }

    fn reserve_nonce(&self, epoch_index: u64) -> u64 {
        if let Some(counter) = self.nonces.get(&epoch_index) {
            return counter.fetch_add(1, Ordering::SeqCst);
        }
        self.nonces
            .entry(epoch_index)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::SeqCst)
    }
}
