//! Prometheus metrics for bets, verifications and integrity alarms

use crate::errors::FairError;
use crate::games::types::GameKind;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct FairnessMetrics {
    registry: Registry,
    bets_total: IntCounterVec,
    verifications_total: IntCounterVec,
    errors_total: IntCounterVec,
    integrity_alarms_total: IntCounter,
    seed_rotations_total: IntCounter,
}

impl FairnessMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("fairplay".to_string()), None)?;

        let bets_total = IntCounterVec::new(
            Opts::new("bets_total", "Outcomes generated, by game"),
            &["game"],
        )?;
        let verifications_total = IntCounterVec::new(
            Opts::new("verifications_total", "Verification requests, by result"),
            &["result"],
        )?;
        let errors_total = IntCounterVec::new(
            Opts::new("errors_total", "Failed operations, by error code"),
            &["code"],
        )?;
        let integrity_alarms_total = IntCounter::new(
            "integrity_alarms_total",
            "Commitment mismatches and fairness violations",
        )?;
        let seed_rotations_total =
            IntCounter::new("seed_rotations_total", "Server seeds committed after a reveal")?;

        registry.register(Box::new(bets_total.clone()))?;
        registry.register(Box::new(verifications_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(integrity_alarms_total.clone()))?;
        registry.register(Box::new(seed_rotations_total.clone()))?;

        Ok(Self {
            registry,
            bets_total,
            verifications_total,
            errors_total,
            integrity_alarms_total,
            seed_rotations_total,
        })
    }

    pub fn record_bet(&self, kind: GameKind) {
        let game = kind.to_string();
        self.bets_total.with_label_values(&[game.as_str()]).inc();
    }

    pub fn record_verification(&self, valid: bool) {
        let result = if valid { "valid" } else { "invalid" };
        self.verifications_total.with_label_values(&[result]).inc();
    }

    pub fn record_error(&self, err: &FairError) {
        self.errors_total.with_label_values(&[err.code()]).inc();
        if err.is_integrity_alarm() {
            self.integrity_alarms_total.inc();
        }
    }

    pub fn record_rotation(&self) {
        self.seed_rotations_total.inc();
    }

    pub fn integrity_alarms(&self) -> u64 {
        self.integrity_alarms_total.get()
    }

    /// Prometheus text exposition format
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!("Failed to encode metrics: {}", e);
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_render() {
        let metrics = FairnessMetrics::new().unwrap();
        metrics.record_bet(GameKind::Slots);
        metrics.record_verification(true);
        metrics.record_error(&FairError::FairnessViolation {
            nonce: 1,
            claimed: "heads".to_string(),
            recomputed: "tails".to_string(),
        });
        metrics.record_error(&FairError::NoActiveSeed);

        assert_eq!(metrics.integrity_alarms(), 1);
        let text = metrics.render();
        assert!(text.contains("fairplay_bets_total{game=\"slots\"} 1"));
        assert!(text.contains("fairplay_errors_total{code=\"NO_ACTIVE_SEED\"} 1"));
        assert!(text.contains("fairplay_integrity_alarms_total 1"));
    }
}
