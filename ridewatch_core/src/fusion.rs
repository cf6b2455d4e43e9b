//! Weighted fusion of the three detector scores.

use crate::config::FusionWeights;
use crate::error::{DetectionError, Result};

pub const REASON_NORMAL: &str = "normal state";
pub const REASON_STARTED: &str = "monitoring started";
pub const REASON_STOPPED: &str = "monitoring stopped";

const FACTOR_SIGNAL: &str = "weak positioning";
const FACTOR_MOTION: &str = "transit motion pattern";
const FACTOR_NETWORK: &str = "network environment change";

/// Individual scores above this are named in the reason.
const FACTOR_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Fused {
    pub confidence: f32,
    pub detected: bool,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ConfidenceFusionEngine {
    weights: FusionWeights,
    threshold: f32,
}

impl ConfidenceFusionEngine {
    pub fn new(weights: FusionWeights, threshold: f32) -> Self {
        Self { weights, threshold }
    }

    pub fn weights(&self) -> FusionWeights {
        self.weights
    }

    /// Combine the scores into a clamped confidence and a reason.
    ///
    /// # Errors
    /// `DetectionError::NonFiniteScore` if any input (or the weighted sum) is
    /// NaN or infinite.
    pub fn fuse(&self, signal_loss: f32, motion: f32, network: f32) -> Result<Fused> {
        for (name, v) in [
            ("signal_loss", signal_loss),
            ("motion", motion),
            ("network", network),
        ] {
            if !v.is_finite() {
                return Err(eyre::Report::new(DetectionError::NonFiniteScore(name)));
            }
        }
        let w = self.weights;
        let raw = signal_loss * w.signal_loss + motion * w.motion + network * w.network;
        if !raw.is_finite() {
            return Err(eyre::Report::new(DetectionError::NonFiniteScore("confidence")));
        }
        let confidence = raw.clamp(0.0, 1.0);
        Ok(Fused {
            confidence,
            detected: confidence > self.threshold,
            reason: reason(signal_loss, motion, network),
        })
    }
}

/// "detected: a, b" naming every factor above 0.5 in signal/motion/network
/// order, or the normal-state message.
pub fn reason(signal_loss: f32, motion: f32, network: f32) -> String {
    let factors: Vec<&str> = [
        (signal_loss, FACTOR_SIGNAL),
        (motion, FACTOR_MOTION),
        (network, FACTOR_NETWORK),
    ]
    .into_iter()
    .filter(|&(score, _)| score > FACTOR_THRESHOLD)
    .map(|(_, name)| name)
    .collect();
    if factors.is_empty() {
        REASON_NORMAL.to_string()
    } else {
        format!("detected: {}", factors.join(", "))
    }
}
