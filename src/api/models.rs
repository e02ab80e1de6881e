//! API Request and Response Models

use crate::{
    games::types::{GameKind, Outcome},
    seeds::{ClientSeed, RevealReceipt},
    sequencer::EpochAudit,
};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Public commitment shown to the player before betting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentResponse {
    pub epoch_index: u64,
    pub commitment: String,
    pub client_seed: ClientSeed,
    pub next_nonce: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSeedRequest {
    pub value: String,
}

/// Operator request to reveal an epoch. Without `plaintext` the registry's
/// held seed is disclosed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealRequest {
    pub epoch_index: u64,
    #[serde(default)]
    pub plaintext: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealResponse {
    #[serde(flatten)]
    pub receipt: RevealReceipt,
    pub audit: EpochAudit,
}

/// Public verification request. `claimed_outcome` may be a string (`"heads"`,
/// `"cherry,coin,star"`), a number (`42`) or an array of symbol names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyApiRequest {
    pub game_kind: GameKind,
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    pub claimed_outcome: serde_json::Value,
    #[serde(default)]
    pub commitment: Option<String>,
}

impl VerifyApiRequest {
    /// Normalise the claimed outcome to its textual form
    pub fn claimed_text(&self) -> Result<String, String> {
        match &self.claimed_outcome {
            serde_json::Value::String(s) => Ok(s.clone()),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| format!("slot symbol {} is not a string", item))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|symbols| symbols.join(",")),
            other => Err(format!("unsupported claimed outcome {}", other)),
        }
    }
}

/// Response from verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed_outcome: Option<Outcome>,
    pub commitment: String,
    pub digest: String,
}
