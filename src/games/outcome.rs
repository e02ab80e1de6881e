//! Deterministic outcome derivation.
//!
//! This is the public protocol third-party verifiers reimplement:
//!
//! 1. message = `"{server_seed}-{client_seed}-{nonce}"` (nonce in decimal)
//! 2. digest  = lowercase hex of SHA-256(message)
//! 3. draw i  = hex chars `[8i, 8i + 8)` parsed as an unsigned 32-bit integer
//! 4. coinflip: `draw0 % 2 == 0` is heads; diceroll: `draw0 % 100 + 1`;
//!    slots: reel i is symbol `draw_i % 7`
//!
//! Nothing here reads state, clocks or randomness.

use crate::errors::{FairError, FairResult};
use crate::games::types::{CoinSide, GameKind, Outcome, RawOutput, SlotSymbol, SLOT_REELS};
use sha2::{Digest, Sha256};

pub const MESSAGE_SEPARATOR: char = '-';

/// Hex characters consumed per draw
pub const DRAW_HEX_WIDTH: usize = 8;

/// Build the combined message hashed for one outcome
pub fn combined_message(server_seed: &str, client_seed: &str, nonce: u64) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        server_seed,
        client_seed,
        nonce,
        sep = MESSAGE_SEPARATOR
    )
}

/// Lowercase hex SHA-256 of arbitrary text
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Parse the `index`-th fixed-width slice of a hex digest as `u32`
pub fn draw_from_digest(digest_hex: &str, index: usize) -> FairResult<u32> {
    let start = index * DRAW_HEX_WIDTH;
    let slice = digest_hex
        .get(start..start + DRAW_HEX_WIDTH)
        .ok_or_else(|| FairError::invalid(format!("digest too short for draw {}", index)))?;
    u32::from_str_radix(slice, 16)
        .map_err(|e| FairError::invalid(format!("digest slice '{}' is not hex: {}", slice, e)))
}

/// Compute the raw derived value for a seed triple
pub fn raw_output(kind: GameKind, server_seed: &str, client_seed: &str, nonce: u64) -> RawOutput {
    let digest = Sha256::digest(combined_message(server_seed, client_seed, nonce).as_bytes());
    let draws = digest
        .chunks_exact(DRAW_HEX_WIDTH / 2)
        .take(kind.draws())
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    RawOutput {
        digest_hex: hex::encode(digest),
        draws,
    }
}

/// Interpret raw draws for a game kind
pub fn interpret(kind: GameKind, raw: &RawOutput) -> FairResult<Outcome> {
    if raw.draws.len() < kind.draws() {
        return Err(FairError::invalid(format!(
            "{} needs {} draws, got {}",
            kind,
            kind.draws(),
            raw.draws.len()
        )));
    }
    Ok(interpret_draws(kind, &raw.draws))
}

// Caller guarantees draws.len() >= kind.draws()
fn interpret_draws(kind: GameKind, draws: &[u32]) -> Outcome {
    match kind {
        GameKind::CoinFlip => Outcome::CoinFlip(compute_coinflip(draws[0])),
        GameKind::DiceRoll => Outcome::DiceRoll(compute_diceroll(draws[0])),
        GameKind::Slots => {
            let mut reels = [SlotSymbol::Cherry; SLOT_REELS];
            for (reel, draw) in reels.iter_mut().zip(draws) {
                *reel = compute_reel(*draw);
            }
            Outcome::Slots(reels)
        }
    }
}

/// Full pipeline: seed triple to `(raw, interpreted)`
pub fn generate_outcome(
    kind: GameKind,
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
) -> (RawOutput, Outcome) {
    let raw = raw_output(kind, server_seed, client_seed, nonce);
    let outcome = interpret_draws(kind, &raw.draws);
    (raw, outcome)
}

pub fn compute_coinflip(draw: u32) -> CoinSide {
    if draw % 2 == 0 {
        CoinSide::Heads
    } else {
        CoinSide::Tails
    }
}

pub fn compute_diceroll(draw: u32) -> u8 {
    (draw % 100) as u8 + 1
}

pub fn compute_reel(draw: u32) -> SlotSymbol {
    SlotSymbol::from_index((draw % SlotSymbol::TABLE.len() as u32) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOLDEN_DIGEST: &str = "188db1003561180f30e0e1f8df1ea912ed59bc7c788fbadc577839bd2635faac";

    #[test]
    fn test_golden_vector() {
        assert_eq!(combined_message("abc123", "player-xyz", 0), "abc123-player-xyz-0");

        let (raw, outcome) = generate_outcome(GameKind::CoinFlip, "abc123", "player-xyz", 0);
        assert_eq!(raw.digest_hex, GOLDEN_DIGEST);
        assert_eq!(raw.draws, vec![0x188d_b100]);
        assert_eq!(raw.draws[0], 411_939_072);
        assert_eq!(outcome, Outcome::CoinFlip(CoinSide::Heads));

        let (_, dice) = generate_outcome(GameKind::DiceRoll, "abc123", "player-xyz", 0);
        assert_eq!(dice, Outcome::DiceRoll(73));

        let (raw, slots) = generate_outcome(GameKind::Slots, "abc123", "player-xyz", 0);
        assert_eq!(raw.draws, vec![411_939_072, 895_555_599, 820_044_280]);
        assert_eq!(
            slots,
            Outcome::Slots([SlotSymbol::Jackpot, SlotSymbol::Coin, SlotSymbol::Jackpot])
        );
    }

    #[test]
    fn test_second_golden_vector() {
        let (raw, coin) = generate_outcome(GameKind::CoinFlip, "abc123", "player-xyz", 7);
        assert!(raw.digest_hex.starts_with("3a4230a7"));
        assert_eq!(coin, Outcome::CoinFlip(CoinSide::Tails));

        let (_, dice) = generate_outcome(GameKind::DiceRoll, "abc123", "player-xyz", 7);
        assert_eq!(dice, Outcome::DiceRoll(60));

        let (_, slots) = generate_outcome(GameKind::Slots, "abc123", "player-xyz", 7);
        assert_eq!(
            slots,
            Outcome::Slots([SlotSymbol::Gem, SlotSymbol::Diamond, SlotSymbol::Star])
        );
    }

    #[test]
    fn test_commitment_hash() {
        assert_eq!(
            sha256_hex("abc123"),
            "6ca13d52ca70c883e0f0bb101e425a89e8624de51db2d2392593af6a84118090"
        );
    }

    #[test]
    fn test_draw_parsing_is_unsigned_and_full_width() {
        assert_eq!(draw_from_digest("ffffffff00000000", 0).unwrap(), u32::MAX);
        assert_eq!(draw_from_digest("ffffffff00000000", 1).unwrap(), 0);
        assert!(draw_from_digest("ffff", 0).is_err());
        assert!(draw_from_digest("zzzzzzzz", 0).is_err());
    }

    #[test]
    fn test_hex_and_byte_draws_agree() {
        let raw = raw_output(GameKind::Slots, "server", "client", 42);
        for (i, draw) in raw.draws.iter().enumerate() {
            assert_eq!(draw_from_digest(&raw.digest_hex, i).unwrap(), *draw);
        }
    }

    #[test]
    fn test_range_extremes() {
        assert_eq!(compute_diceroll(0), 1);
        assert_eq!(compute_diceroll(99), 100);
        assert_eq!(compute_diceroll(u32::MAX), (u32::MAX % 100) as u8 + 1);
        assert_eq!(compute_coinflip(u32::MAX), CoinSide::Tails);
        assert_eq!(compute_reel(6), SlotSymbol::Jackpot);
        assert_eq!(compute_reel(7), SlotSymbol::Cherry);
    }

    #[test]
    fn test_interpret_rejects_short_raw() {
        let raw = RawOutput {
            digest_hex: String::new(),
            draws: vec![1],
        };
        assert!(interpret(GameKind::Slots, &raw).is_err());
    }
}
