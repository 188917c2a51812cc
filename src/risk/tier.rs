//! Threshold-relative discretization of a predicted probability.

use serde::{Deserialize, Serialize};

/// Fraction of the decision threshold where the medium tier begins.
pub const MEDIUM_FRACTION: f32 = 0.6;

/// Ordinal risk bucket for a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }
}

/// Bucket a probability against a threshold.
///
/// High at or above the threshold, medium at or above
/// [`MEDIUM_FRACTION`] of it — the medium boundary scales with the
/// threshold rather than sitting at a fixed probability.
pub fn tier(probability: f32, threshold: f32) -> RiskTier {
    if probability >= threshold {
        RiskTier::High
    } else if probability >= MEDIUM_FRACTION * threshold {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}
