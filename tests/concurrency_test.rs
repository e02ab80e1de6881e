//! Concurrent bet placement and rotation

use fairplay::{GameKind, SeedRegistry, SessionSequencer};
use std::{collections::HashSet, sync::Arc, thread};

const THREADS: usize = 8;
const BETS_PER_THREAD: usize = 250;

#[test]
fn test_concurrent_bets_get_distinct_gapless_nonces() {
    let registry = Arc::new(SeedRegistry::new(16));
    registry.commit_new_server_seed().unwrap();
    let sequencer = Arc::new(SessionSequencer::in_memory(registry));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let sequencer = sequencer.clone();
            thread::spawn(move || {
                let kind = GameKind::ALL[t % GameKind::ALL.len()];
                (0..BETS_PER_THREAD)
                    .map(|_| sequencer.place_bet(kind).unwrap().nonce)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut nonces: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    nonces.sort_unstable();

    let total = (THREADS * BETS_PER_THREAD) as u64;
    assert_eq!(nonces, (0..total).collect::<Vec<_>>());
    assert_eq!(sequencer.next_nonce(0), total);
    assert_eq!(sequencer.records_for_epoch(0).len(), total as usize);
}

#[test]
fn test_bets_racing_rotation_stay_consistent() {
    let registry = Arc::new(SeedRegistry::new(16));
    registry.commit_new_server_seed().unwrap();
    let sequencer = Arc::new(SessionSequencer::in_memory(registry.clone()));

    let bettors: Vec<_> = (0..4)
        .map(|_| {
            let sequencer = sequencer.clone();
            thread::spawn(move || {
                (0..200)
                    .map(|_| sequencer.place_bet(GameKind::Slots).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let rotator = {
        let registry = registry.clone();
        thread::spawn(move || {
            for _ in 0..10 {
                let active = registry.active_server_seed().unwrap();
                registry.reveal_held_seed(active.epoch_index).unwrap();
            }
        })
    };

    rotator.join().unwrap();
    let records: Vec<_> = bettors
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    // Each epoch's nonces are unique and start at zero without gaps
    let history = registry.history();
    let mut seen = HashSet::new();
    for seed in &history {
        let epoch_records = sequencer.records_for_epoch(seed.epoch_index);
        for (i, record) in epoch_records.iter().enumerate() {
            assert_eq!(record.nonce, i as u64);
            assert_eq!(record.server_seed_ref, seed.hashed_value);
            assert!(seen.insert((record.epoch_index, record.nonce)));
        }
    }
    assert_eq!(seen.len(), records.len());

    // Every revealed epoch audits cleanly
    for seed in history.iter().filter(|s| s.revealed_value.is_some()) {
        sequencer.audit_epoch(seed.epoch_index).unwrap();
    }
}

#[test]
fn test_concurrent_reveals_of_same_epoch_rotate_once() {
    let registry = Arc::new(SeedRegistry::new(16));
    registry.commit_new_server_seed().unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || registry.reveal_held_seed(0).unwrap())
        })
        .collect();

    let receipts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let rotations = receipts
        .iter()
        .filter(|r| r.next_commitment.is_some())
        .count();

    assert_eq!(rotations, 1);
    assert_eq!(registry.history().len(), 2);
    assert!(receipts
        .windows(2)
        .all(|w| w[0].revealed_value == w[1].revealed_value));
}
