//! Property tests for outcome derivation and verification

use fairplay::{
    games::{
        outcome::{draw_from_digest, generate_outcome, interpret, sha256_hex},
        processor::{dice_multiplier, settle, DICE_MAX_MULTIPLIER},
        types::{BetSelection, GameOutcome, SlotSymbol},
    },
    verifier::{check_commitment, verify_outcome},
    FairError, GameKind, Outcome, VerifyRequest,
};
use proptest::prelude::*;

fn game_kind() -> impl Strategy<Value = GameKind> {
    prop_oneof![
        Just(GameKind::CoinFlip),
        Just(GameKind::DiceRoll),
        Just(GameKind::Slots),
    ]
}

proptest! {
    #[test]
    fn prop_generation_is_deterministic(
        kind in game_kind(),
        server in "[a-f0-9]{1,64}",
        client in "[A-Za-z0-9-]{1,32}",
        nonce in any::<u64>(),
    ) {
        let first = generate_outcome(kind, &server, &client, nonce);
        let second = generate_outcome(kind, &server, &client, nonce);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_outcomes_stay_in_range(
        kind in game_kind(),
        server in "[a-f0-9]{64}",
        client in "[A-Za-z0-9]{16}",
        nonce in any::<u64>(),
    ) {
        let (raw, outcome) = generate_outcome(kind, &server, &client, nonce);
        prop_assert_eq!(raw.digest_hex.len(), 64);
        prop_assert_eq!(raw.draws.len(), kind.draws());
        prop_assert_eq!(outcome.kind(), kind);
        if let Outcome::DiceRoll(roll) = outcome {
            prop_assert!((1..=100).contains(&roll));
        }
        prop_assert_eq!(interpret(kind, &raw).unwrap(), outcome);
    }

    #[test]
    fn prop_draws_match_hex_slices(
        server in "[a-z0-9]{1,40}",
        client in "[a-z0-9]{1,40}",
        nonce in 0u64..10_000,
    ) {
        let (raw, _) = generate_outcome(GameKind::Slots, &server, &client, nonce);
        for (i, draw) in raw.draws.iter().enumerate() {
            prop_assert_eq!(draw_from_digest(&raw.digest_hex, i).unwrap(), *draw);
        }
    }

    #[test]
    fn prop_generated_outcome_always_verifies(
        kind in game_kind(),
        server in "[a-f0-9]{64}",
        client in "[A-Za-z0-9]{16}",
        nonce in any::<u64>(),
    ) {
        let (_, outcome) = generate_outcome(kind, &server, &client, nonce);
        prop_assert!(verify_outcome(kind, &server, &client, nonce, &outcome));

        let verification = fairplay::verify(&VerifyRequest {
            game_kind: kind,
            server_seed: server.clone(),
            client_seed: client.clone(),
            nonce,
            claimed_outcome: outcome.to_string(),
            commitment: Some(sha256_hex(&server)),
        }).unwrap();
        prop_assert_eq!(verification.outcome, outcome);
    }

    #[test]
    fn prop_any_other_dice_roll_is_rejected(
        server in "[a-f0-9]{64}",
        client in "[A-Za-z0-9]{16}",
        nonce in any::<u64>(),
        claimed in 1u8..=100,
    ) {
        let (_, outcome) = generate_outcome(GameKind::DiceRoll, &server, &client, nonce);
        prop_assume!(outcome != Outcome::DiceRoll(claimed));

        let result = fairplay::verify(&VerifyRequest {
            game_kind: GameKind::DiceRoll,
            server_seed: server,
            client_seed: client,
            nonce,
            claimed_outcome: claimed.to_string(),
            commitment: None,
        });
        let is_violation = matches!(result, Err(FairError::FairnessViolation { .. }));
        prop_assert!(is_violation);
    }

    #[test]
    fn prop_commitment_binds_seed(seed in "[a-f0-9]{64}", other in "[a-f0-9]{64}") {
        let commitment = sha256_hex(&seed);
        prop_assert!(check_commitment(&seed, &commitment).is_ok());
        prop_assert!(check_commitment(&seed, &commitment.to_uppercase()).is_ok());
        if other != seed {
            prop_assert!(check_commitment(&other, &commitment).is_err());
        }
    }

    #[test]
    fn prop_dice_payout_never_exceeds_cap(target in 2u8..=99, over in any::<bool>(), roll in 1u8..=100) {
        let multiplier = dice_multiplier(target, over);
        prop_assert!(multiplier > 0.0 && multiplier <= DICE_MAX_MULTIPLIER);

        let (result, payout) = settle(
            &BetSelection::DiceRoll { target, over },
            &Outcome::DiceRoll(roll),
            1.0,
        ).unwrap();
        let won = if over { roll > target } else { roll < target };
        prop_assert_eq!(result == GameOutcome::Win, won);
        prop_assert_eq!(payout > 0.0, won);
    }

    #[test]
    fn prop_slots_payout_only_on_matches(a in 0usize..7, b in 0usize..7, c in 0usize..7) {
        let reels = [SlotSymbol::from_index(a), SlotSymbol::from_index(b), SlotSymbol::from_index(c)];
        let (result, payout) = settle(&BetSelection::Slots, &Outcome::Slots(reels), 1.0).unwrap();
        let matched = a == b || b == c || a == c;
        prop_assert_eq!(result == GameOutcome::Win, matched);
        prop_assert_eq!(payout > 0.0, matched);
    }
}
