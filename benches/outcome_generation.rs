use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fairplay::{
    games::outcome::generate_outcome, GameKind, SeedRegistry, SessionSequencer, VerifyRequest,
};
use std::sync::Arc;

const SERVER_SEED: &str = "6ca13d52ca70c883e0f0bb101e425a89e8624de51db2d2392593af6a84118090";

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_outcome");
    for kind in GameKind::ALL {
        group.bench_function(kind.to_string(), |b| {
            let mut nonce = 0u64;
            b.iter(|| {
                nonce = nonce.wrapping_add(1);
                generate_outcome(kind, black_box(SERVER_SEED), black_box("player-xyz"), nonce)
            })
        });
    }
    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let (_, outcome) = generate_outcome(GameKind::Slots, SERVER_SEED, "player-xyz", 7);
    let request = VerifyRequest {
        game_kind: GameKind::Slots,
        server_seed: SERVER_SEED.to_string(),
        client_seed: "player-xyz".to_string(),
        nonce: 7,
        claimed_outcome: outcome.to_string(),
        commitment: None,
    };
    c.bench_function("verify_slots", |b| b.iter(|| fairplay::verify(black_box(&request))));
}

fn bench_place_bet(c: &mut Criterion) {
    let registry = Arc::new(SeedRegistry::new(16));
    registry.commit_new_server_seed().unwrap();
    let sequencer = SessionSequencer::in_memory(registry);
    c.bench_function("place_bet_diceroll", |b| {
        b.iter(|| sequencer.place_bet(black_box(GameKind::DiceRoll)))
    });
}

criterion_group!(benches, bench_generate, bench_verify, bench_place_bet);
criterion_main!(benches);
