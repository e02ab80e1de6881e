//! Stateless audit of past outcomes against a revealed server seed.
//!
//! Verification only hashes and compares, so repeated calls with the same
//! inputs always return the same answer.

use crate::errors::{FairError, FairResult};
use crate::games::outcome::{generate_outcome, sha256_hex};
use crate::games::types::{GameKind, Outcome, OutcomeRecord, RawOutput};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Inputs a player supplies to audit one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub game_kind: GameKind,
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    /// Claimed outcome in textual form (`heads`, `42`, `cherry,coin,star`)
    pub claimed_outcome: String,
    /// Commitment published before the round; checked against the seed when given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<String>,
}

/// Successful verification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verification {
    pub game_kind: GameKind,
    pub nonce: u64,
    /// SHA-256 of the supplied server seed
    pub commitment: String,
    pub raw_output: RawOutput,
    pub outcome: Outcome,
}

/// True iff recomputing the outcome from the inputs equals `claimed`
pub fn verify_outcome(
    kind: GameKind,
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    claimed: &Outcome,
) -> bool {
    if claimed.kind() != kind {
        return false;
    }
    let (_, recomputed) = generate_outcome(kind, server_seed, client_seed, nonce);
    recomputed == *claimed
}

/// Check a plaintext seed against a published commitment, returning its hash
pub fn check_commitment(server_seed: &str, commitment: &str) -> FairResult<String> {
    let computed = sha256_hex(server_seed);
    if !computed.eq_ignore_ascii_case(commitment.trim()) {
        return Err(FairError::WrongSeedReference {
            commitment: commitment.trim().to_string(),
            computed,
        });
    }
    Ok(computed)
}

/// Full verification with distinct errors for bad input, wrong seed and unfair outcome
pub fn verify(request: &VerifyRequest) -> FairResult<Verification> {
    if request.server_seed.is_empty() {
        return Err(FairError::invalid("server seed must not be empty"));
    }
    if request.client_seed.is_empty() {
        return Err(FairError::invalid("client seed must not be empty"));
    }
    let claimed = Outcome::parse(request.game_kind, &request.claimed_outcome)?;

    let commitment = match &request.commitment {
        Some(c) => check_commitment(&request.server_seed, c)?,
        None => sha256_hex(&request.server_seed),
    };

    let (raw_output, recomputed) = generate_outcome(
        request.game_kind,
        &request.server_seed,
        &request.client_seed,
        request.nonce,
    );
    if recomputed != claimed {
        // A player's claim is untrusted input, not evidence against the house
        warn!(
            nonce = request.nonce,
            claimed = %claimed,
            recomputed = %recomputed,
            "Claimed outcome does not match recomputation"
        );
        return Err(violation(request.nonce, &claimed.to_string(), &recomputed.to_string()));
    }

    Ok(Verification {
        game_kind: request.game_kind,
        nonce: request.nonce,
        commitment,
        raw_output,
        outcome: recomputed,
    })
}

/// Verify a stored record against the revealed plaintext of its seed
pub fn verify_record(record: &OutcomeRecord, revealed_seed: &str) -> FairResult<Verification> {
    let commitment = check_commitment(revealed_seed, &record.server_seed_ref)?;

    let (raw_output, recomputed) = generate_outcome(
        record.game_kind,
        revealed_seed,
        &record.client_seed_value,
        record.nonce,
    );
    if recomputed != record.interpreted_outcome {
        return Err(alarm(violation(
            record.nonce,
            &record.interpreted_outcome.to_string(),
            &recomputed.to_string(),
        )));
    }
    if raw_output != record.raw_output {
        return Err(alarm(violation(
            record.nonce,
            &record.raw_output.digest_hex,
            &raw_output.digest_hex,
        )));
    }

    Ok(Verification {
        game_kind: record.game_kind,
        nonce: record.nonce,
        commitment,
        raw_output,
        outcome: recomputed,
    })
}

fn violation(nonce: u64, claimed: &str, recomputed: &str) -> FairError {
    FairError::FairnessViolation {
        nonce,
        claimed: claimed.to_string(),
        recomputed: recomputed.to_string(),
    }
}

/// A stored record that no longer matches its seed means the house's own data is wrong
fn alarm(err: FairError) -> FairError {
    error!(target: "fairness::alarm", error = %err, "Stored record failed verification");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::CoinSide;
    use chrono::Utc;
    use uuid::Uuid;

    const COMMITMENT: &str = "6ca13d52ca70c883e0f0bb101e425a89e8624de51db2d2392593af6a84118090";

    fn request(claimed: &str) -> VerifyRequest {
        VerifyRequest {
            game_kind: GameKind::CoinFlip,
            server_seed: "abc123".to_string(),
            client_seed: "player-xyz".to_string(),
            nonce: 0,
            claimed_outcome: claimed.to_string(),
            commitment: Some(COMMITMENT.to_string()),
        }
    }

    #[test]
    fn test_verify_golden_round() {
        let verification = verify(&request("heads")).unwrap();
        assert_eq!(verification.outcome, Outcome::CoinFlip(CoinSide::Heads));
        assert_eq!(verification.commitment, COMMITMENT);
        assert!(verify_outcome(
            GameKind::CoinFlip,
            "abc123",
            "player-xyz",
            0,
            &Outcome::CoinFlip(CoinSide::Heads)
        ));
    }

    #[test]
    fn test_wrong_claim_is_fairness_violation() {
        let err = verify(&request("tails")).unwrap_err();
        assert!(matches!(err, FairError::FairnessViolation { nonce: 0, .. }));
        assert!(err.is_integrity_alarm());
        assert!(!verify_outcome(
            GameKind::CoinFlip,
            "abc123",
            "player-xyz",
            0,
            &Outcome::CoinFlip(CoinSide::Tails)
        ));
    }

    #[test]
    fn test_wrong_seed_reference_is_distinct() {
        let mut req = request("heads");
        req.commitment = Some("00".repeat(32));
        let err = verify(&req).unwrap_err();
        assert!(matches!(err, FairError::WrongSeedReference { .. }));
        assert!(!err.is_integrity_alarm());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(verify(&request("sideways")), Err(FairError::InvalidInput(_))));

        let mut req = request("heads");
        req.client_seed.clear();
        assert!(matches!(verify(&req), Err(FairError::InvalidInput(_))));
    }

    #[test]
    fn test_mismatched_kind_never_verifies() {
        assert!(!verify_outcome(
            GameKind::DiceRoll,
            "abc123",
            "player-xyz",
            0,
            &Outcome::CoinFlip(CoinSide::Heads)
        ));
    }

    #[test]
    fn test_commitment_check_is_case_insensitive() {
        assert!(check_commitment("abc123", &COMMITMENT.to_uppercase()).is_ok());
    }

    #[test]
    fn test_verify_record() {
        let (raw_output, outcome) = generate_outcome(GameKind::DiceRoll, "abc123", "player-xyz", 0);
        let mut record = OutcomeRecord {
            id: Uuid::new_v4(),
            game_kind: GameKind::DiceRoll,
            server_seed_ref: COMMITMENT.to_string(),
            epoch_index: 0,
            client_seed_value: "player-xyz".to_string(),
            nonce: 0,
            raw_output,
            interpreted_outcome: outcome,
            created_at: Utc::now(),
        };

        assert_eq!(verify_record(&record, "abc123").unwrap().outcome, Outcome::DiceRoll(73));
        assert!(matches!(
            verify_record(&record, "not-the-seed"),
            Err(FairError::WrongSeedReference { .. })
        ));

        record.interpreted_outcome = Outcome::DiceRoll(74);
        assert!(matches!(
            verify_record(&record, "abc123"),
            Err(FairError::FairnessViolation { .. })
        ));
    }

    #[test]
    fn test_verification_is_repeatable() {
        let req = request("heads");
        assert_eq!(verify(&req).unwrap(), verify(&req).unwrap());
    }
}
