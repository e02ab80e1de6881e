//! Server seed commit/reveal lifecycle and the active client seed.
//!
//! All state sits behind one `RwLock`. Anything that changes which seed is
//! active (commit, rotate, reveal) takes the write lock; bet placement reads
//! the active seed through [`SeedRegistry::with_active_seed`] under the read
//! lock, so a bet can never straddle a rotation.
//!
//! The history is append-only. Plaintext seeds stay inside the registry until
//! they are revealed; the public [`ServerSeed`] view only carries them after
//! reveal.

use crate::config::RegistryConfig;
use crate::errors::{FairError, FairResult};
use crate::games::outcome::sha256_hex;
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::{error, info, warn};

/// Bytes of OS entropy per server seed
pub const SERVER_SEED_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeedState {
    /// Published commitment, currently used for new bets
    Committed,
    /// Rotated away: no new bets, plaintext still secret
    Retired,
    /// Plaintext disclosed; closed forever
    Revealed,
}

/// Public view of one server seed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSeed {
    pub epoch_index: u64,
    pub hashed_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revealed_value: Option<String>,
    pub state: SeedState,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientSeed {
    pub value: String,
    pub created_at: DateTime<Utc>,
}

/// Borrowed view of the active seed pair, handed to bet placement
#[derive(Clone, Copy)]
pub struct ActiveSeed<'a> {
    pub epoch_index: u64,
    pub hashed_value: &'a str,
    pub server_seed: &'a str,
    pub client_seed: &'a str,
}

/// Result of a reveal-and-rotate operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealReceipt {
    pub epoch_index: u64,
    pub revealed_value: String,
    /// Commitment of the replacement seed, when the revealed seed was active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_commitment: Option<String>,
}

/// Persisted form of the registry, secrets included
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub seeds: Vec<StoredSeed>,
    pub client_seed: ClientSeed,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StoredSeed {
    pub seed: ServerSeed,
    pub plaintext: String,
}

#[derive(Clone)]
struct RegistryState {
    seeds: Vec<StoredSeed>,
    client_seed: ClientSeed,
}

impl RegistryState {
    fn active_index(&self) -> Option<usize> {
        self.seeds
            .iter()
            .rposition(|entry| entry.seed.state == SeedState::Committed)
    }

    fn commit_new(&mut self) -> &ServerSeed {
        let plaintext = generate_server_seed();
        let hashed_value = sha256_hex(&plaintext);

        for entry in self.seeds.iter_mut() {
            if entry.seed.state == SeedState::Committed {
                entry.seed.state = SeedState::Retired;
            }
        }

        let epoch_index = self.seeds.len() as u64;
        self.seeds.push(StoredSeed {
            seed: ServerSeed {
                epoch_index,
                hashed_value,
                revealed_value: None,
                state: SeedState::Committed,
                created_at: Utc::now(),
                used_at: None,
            },
            plaintext,
        });

        let seed = &self.seeds[epoch_index as usize].seed;
        info!(epoch = seed.epoch_index, commitment = %seed.hashed_value, "Committed new server seed");
        seed
    }

    /// Returns the revealed value and whether the seed was the active one
    fn reveal(&mut self, epoch_index: u64, plaintext: &str) -> FairResult<(String, bool)> {
        let history_len = self.seeds.len();
        let entry = usize::try_from(epoch_index)
            .ok()
            .and_then(|i| self.seeds.get_mut(i))
            .ok_or(FairError::SeedNotFound { epoch_index, history_len })?;

        let computed = sha256_hex(plaintext);
        if computed != entry.seed.hashed_value {
            error!(
                target: "fairness::alarm",
                epoch = epoch_index,
                expected = %entry.seed.hashed_value,
                computed = %computed,
                "Revealed plaintext does not match the published commitment"
            );
            return Err(FairError::CommitmentMismatch {
                epoch_index,
                expected: entry.seed.hashed_value.clone(),
                computed,
            });
        }

        if let Some(revealed) = &entry.seed.revealed_value {
            return Ok((revealed.clone(), false));
        }

        let was_active = entry.seed.state == SeedState::Committed;
        entry.seed.revealed_value = Some(plaintext.to_string());
        entry.seed.used_at = Some(Utc::now());
        entry.seed.state = SeedState::Revealed;

        info!(epoch = epoch_index, was_active, "Revealed server seed");
        Ok((plaintext.to_string(), was_active))
    }
}

/// Owner of the seed history and the player's client seed
pub struct SeedRegistry {
    state: RwLock<RegistryState>,
    state_path: Option<PathBuf>,
}

impl SeedRegistry {
    /// Empty in-memory registry with a random client seed
    pub fn new(client_seed_length: usize) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                seeds: Vec::new(),
                client_seed: ClientSeed {
                    value: generate_client_seed(client_seed_length),
                    created_at: Utc::now(),
                },
            }),
            state_path: None,
        }
    }

    /// Build a registry from configuration, loading and persisting history when a
    /// state path is set.
    ///
    /// Nonce counters are not persisted, so a seed that was active when the
    /// snapshot was written is retired on load and a fresh one committed.
    pub fn open(config: &RegistryConfig) -> FairResult<Self> {
        let mut registry = match &config.state_path {
            Some(path) if Path::new(path).exists() => {
                let snapshot = load_snapshot(path)?;
                let registry = Self::restore(snapshot)?;
                if registry.active_server_seed().is_some() {
                    warn!("Retiring server seed left active by previous run");
                    registry.write().commit_new();
                }
                registry
            }
            _ => Self::new(config.client_seed_length),
        };
        registry.state_path = config.state_path.as_ref().map(PathBuf::from);

        if config.commit_on_start && registry.active_server_seed().is_none() {
            registry.commit_new_server_seed()?;
        } else {
            registry.persist(&registry.read())?;
        }

        Ok(registry)
    }

    /// Rebuild a registry from a snapshot, re-checking every commitment
    pub fn restore(snapshot: RegistrySnapshot) -> FairResult<Self> {
        let mut active = 0;
        for (i, entry) in snapshot.seeds.iter().enumerate() {
            let seed = &entry.seed;
            if seed.epoch_index != i as u64 {
                return Err(FairError::Storage(format!(
                    "snapshot epoch {} found at position {}",
                    seed.epoch_index, i
                )));
            }
            let computed = sha256_hex(&entry.plaintext);
            if computed != seed.hashed_value {
                error!(target: "fairness::alarm", epoch = seed.epoch_index, "Stored plaintext does not match commitment");
                return Err(FairError::CommitmentMismatch {
                    epoch_index: seed.epoch_index,
                    expected: seed.hashed_value.clone(),
                    computed,
                });
            }
            match (&seed.state, &seed.revealed_value) {
                (SeedState::Revealed, Some(v)) if *v == entry.plaintext => {}
                (SeedState::Revealed, _) => {
                    return Err(FairError::Storage(format!(
                        "epoch {} marked revealed without matching plaintext",
                        seed.epoch_index
                    )))
                }
                (_, Some(_)) => {
                    return Err(FairError::Storage(format!(
                        "epoch {} carries a revealed value but is not revealed",
                        seed.epoch_index
                    )))
                }
                (SeedState::Committed, None) => active += 1,
                (SeedState::Retired, None) => {}
            }
        }
        if active > 1 {
            return Err(FairError::Storage(format!("snapshot has {} active seeds", active)));
        }

        Ok(Self {
            state: RwLock::new(RegistryState {
                seeds: snapshot.seeds,
                client_seed: snapshot.client_seed,
            }),
            state_path: None,
        })
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.read();
        RegistrySnapshot {
            seeds: state.seeds.clone(),
            client_seed: state.client_seed.clone(),
        }
    }

    /// Replace the active client seed
    pub fn set_client_seed(&self, value: &str) -> FairResult<ClientSeed> {
        if value.is_empty() {
            return Err(FairError::invalid("client seed must not be empty"));
        }

        self.mutate(|state| {
            state.client_seed = ClientSeed {
                value: value.to_string(),
                created_at: Utc::now(),
            };
            Ok(state.client_seed.clone())
        })
    }

    pub fn client_seed(&self) -> ClientSeed {
        self.read().client_seed.clone()
    }

    /// Generate, hash and publish a new server seed; returns the commitment only
    pub fn commit_new_server_seed(&self) -> FairResult<String> {
        self.mutate(|state| Ok(state.commit_new().hashed_value.clone()))
    }

    /// Commit a replacement seed without revealing the current one
    pub fn rotate_server_seed(&self) -> FairResult<String> {
        self.commit_new_server_seed()
    }

    /// Most recent committed, unrevealed seed
    pub fn active_server_seed(&self) -> Option<ServerSeed> {
        let state = self.read();
        state.active_index().map(|i| state.seeds[i].seed.clone())
    }

    /// Commitment players see before betting
    pub fn public_commitment(&self) -> FairResult<String> {
        self.active_server_seed()
            .map(|seed| seed.hashed_value)
            .ok_or(FairError::NoActiveSeed)
    }

    /// Disclose the plaintext for `epoch_index`, checking it against the commitment.
    ///
    /// Revealing the same epoch again with the same plaintext returns the stored value.
    pub fn reveal_server_seed(&self, epoch_index: u64, plaintext: &str) -> FairResult<String> {
        self.mutate(|state| state.reveal(epoch_index, plaintext).map(|(revealed, _)| revealed))
    }

    /// Reveal a seed and, if it was the active one, commit its replacement in the
    /// same critical section
    pub fn reveal_and_rotate(&self, epoch_index: u64, plaintext: &str) -> FairResult<RevealReceipt> {
        self.mutate(|state| {
            let (revealed_value, was_active) = state.reveal(epoch_index, plaintext)?;
            let next_commitment = if was_active {
                Some(state.commit_new().hashed_value.clone())
            } else {
                None
            };
            Ok(RevealReceipt {
                epoch_index,
                revealed_value,
                next_commitment,
            })
        })
    }

    /// Reveal using the plaintext the registry generated for this epoch
    pub fn reveal_held_seed(&self, epoch_index: u64) -> FairResult<RevealReceipt> {
        let plaintext = {
            let state = self.read();
            usize::try_from(epoch_index)
                .ok()
                .and_then(|i| state.seeds.get(i))
                .map(|entry| entry.plaintext.clone())
                .ok_or(FairError::SeedNotFound {
                    epoch_index,
                    history_len: state.seeds.len(),
                })?
        };
        self.reveal_and_rotate(epoch_index, &plaintext)
    }

    pub fn seed(&self, epoch_index: u64) -> Option<ServerSeed> {
        let state = self.read();
        usize::try_from(epoch_index)
            .ok()
            .and_then(|i| state.seeds.get(i))
            .map(|entry| entry.seed.clone())
    }

    /// Public view of the whole history, oldest first
    pub fn history(&self) -> Vec<ServerSeed> {
        self.read().seeds.iter().map(|entry| entry.seed.clone()).collect()
    }

    /// Run `f` against the active seed pair while holding the read lock
    pub fn with_active_seed<R>(&self, f: impl FnOnce(ActiveSeed<'_>) -> R) -> FairResult<R> {
        let state = self.read();
        let index = state.active_index().ok_or(FairError::NoActiveSeed)?;
        let entry = &state.seeds[index];

        Ok(f(ActiveSeed {
            epoch_index: entry.seed.epoch_index,
            hashed_value: &entry.seed.hashed_value,
            server_seed: &entry.plaintext,
            client_seed: &state.client_seed.value,
        }))
    }

    /// True when every mutation writes a snapshot to disk
    pub fn is_persistent(&self) -> bool {
        self.state_path.is_some()
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> FairResult<()> {
        write_snapshot(path.as_ref(), &self.snapshot())
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> FairResult<Self> {
        Self::restore(load_snapshot(path.as_ref())?)
    }

    fn persist(&self, state: &RegistryState) -> FairResult<()> {
        let Some(path) = &self.state_path else {
            return Ok(());
        };
        let snapshot = RegistrySnapshot {
            seeds: state.seeds.clone(),
            client_seed: state.client_seed.clone(),
        };
        write_snapshot(path, &snapshot)
    }

    /// Apply `f` to a copy of the state and swap it in only once the snapshot
    /// is on disk, so a failed write leaves memory and file in agreement.
    fn mutate<R>(&self, f: impl FnOnce(&mut RegistryState) -> FairResult<R>) -> FairResult<R> {
        let mut state = self.write();
        let mut proposed = state.clone();
        let out = f(&mut proposed)?;
        self.persist(&proposed)?;
        *state = proposed;
        Ok(out)
    }

    // Mutations run on a copy that is assigned in one step, so a panic under
    // the lock cannot leave the history half-written.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_snapshot(path: impl AsRef<Path>) -> FairResult<RegistrySnapshot> {
    let bytes = std::fs::read(path.as_ref())?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn write_snapshot(path: &Path, snapshot: &RegistrySnapshot) -> FairResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(snapshot)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// 256 bits from the OS CSPRNG, hex-encoded
fn generate_server_seed() -> String {
    let mut bytes = [0u8; SERVER_SEED_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn generate_client_seed(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length.max(1))
        .map(char::from)
        .collect()
}
