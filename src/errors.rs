//! Error types for the fairplay engine
//!
//! Every failure in the commit-reveal core is terminal and synchronous. The
//! only split that matters for alerting is integrity alarms (possible fraud)
//! versus ordinary misuse.

use crate::config::ConfigValidationError;

/// Root error type for all fairplay operations
#[derive(Debug, thiserror::Error)]
pub enum FairError {
    /// A bet was attempted before any server seed was committed
    #[error("No active server seed: commit a new seed before accepting bets")]
    NoActiveSeed,

    #[error("Server seed epoch {epoch_index} not found (history length {history_len})")]
    SeedNotFound { epoch_index: u64, history_len: usize },

    /// Revealed plaintext does not hash to the published commitment
    #[error("Commitment mismatch for epoch {epoch_index}: expected {expected}, computed {computed}")]
    CommitmentMismatch {
        epoch_index: u64,
        expected: String,
        computed: String,
    },

    #[error("Wrong seed reference: seed hashes to {computed}, commitment is {commitment}")]
    WrongSeedReference { commitment: String, computed: String },

    /// Recomputed outcome differs from the claimed one under a correct seed
    #[error("Fairness violation for nonce {nonce}: claimed {claimed}, recomputed {recomputed}")]
    FairnessViolation {
        nonce: u64,
        claimed: String,
        recomputed: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigValidationError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl FairError {
    /// True for the two failures that indicate tampering or a generator bug
    pub fn is_integrity_alarm(&self) -> bool {
        matches!(
            self,
            FairError::CommitmentMismatch { .. } | FairError::FairnessViolation { .. }
        )
    }

    /// Stable machine-readable code used in API bodies and metric labels
    pub fn code(&self) -> &'static str {
        match self {
            FairError::NoActiveSeed => "NO_ACTIVE_SEED",
            FairError::SeedNotFound { .. } => "SEED_NOT_FOUND",
            FairError::CommitmentMismatch { .. } => "COMMITMENT_MISMATCH",
            FairError::WrongSeedReference { .. } => "WRONG_SEED_REFERENCE",
            FairError::FairnessViolation { .. } => "FAIRNESS_VIOLATION",
            FairError::InvalidInput(_) => "INVALID_INPUT",
            FairError::Configuration(_) => "CONFIGURATION_ERROR",
            FairError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        FairError::InvalidInput(msg.into())
    }
}

impl From<std::io::Error> for FairError {
    fn from(e: std::io::Error) -> Self {
        FairError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for FairError {
    fn from(e: serde_json::Error) -> Self {
        FairError::Storage(format!("Snapshot encoding failed: {}", e))
    }
}

// Convenience type alias for Results
pub type FairResult<T> = Result<T, FairError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_alarm_classification() {
        let mismatch = FairError::CommitmentMismatch {
            epoch_index: 0,
            expected: "aa".to_string(),
            computed: "bb".to_string(),
        };
        let violation = FairError::FairnessViolation {
            nonce: 3,
            claimed: "heads".to_string(),
            recomputed: "tails".to_string(),
        };

        assert!(mismatch.is_integrity_alarm());
        assert!(violation.is_integrity_alarm());
        assert!(!FairError::NoActiveSeed.is_integrity_alarm());
        assert!(!FairError::invalid("bad nonce").is_integrity_alarm());
        assert!(!FairError::WrongSeedReference {
            commitment: "aa".to_string(),
            computed: "bb".to_string(),
        }
        .is_integrity_alarm());
    }

    #[test]
    fn test_error_display() {
        let err = FairError::SeedNotFound { epoch_index: 9, history_len: 2 };
        assert!(err.to_string().contains("epoch 9"));
        assert_eq!(err.code(), "SEED_NOT_FOUND");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: FairError = ConfigValidationError::InvalidValue("port".to_string()).into();
        match err {
            FairError::Configuration(_) => {}
            _ => panic!("Expected configuration error"),
        }
    }
}
