//! One detection cycle: signal loss, motion pattern, network churn, fusion.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::analyzer::{MotionPatternAnalyzer, MotionScores};
use crate::error::{DetectionError, Result};
use crate::fusion::ConfidenceFusionEngine;
use crate::network::NetworkChurnDetector;
use crate::sampler::MotionBuffers;
use crate::signal_loss::{PositionOutcome, SignalLossDetector};
use crate::state::DetectionState;

/// Per-detector scores behind a published state.
#[derive(Debug, Clone, PartialEq)]
pub struct TickScores {
    pub signal_loss: f32,
    pub position: PositionOutcome,
    pub motion: MotionScores,
    pub network: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub state: DetectionState,
    pub scores: TickScores,
}

#[derive(Debug)]
pub struct DetectionEngine {
    buffers: Arc<MotionBuffers>,
    analyzer: MotionPatternAnalyzer,
    signal: SignalLossDetector,
    network: NetworkChurnDetector,
    fusion: ConfidenceFusionEngine,
}

impl DetectionEngine {
    pub fn new(
        buffers: Arc<MotionBuffers>,
        analyzer: MotionPatternAnalyzer,
        signal: SignalLossDetector,
        network: NetworkChurnDetector,
        fusion: ConfidenceFusionEngine,
    ) -> Self {
        Self {
            buffers,
            analyzer,
            signal,
            network,
            fusion,
        }
    }

    /// Per-session setup: record the network baseline.
    pub fn prepare(&mut self) {
        self.network.capture_initial();
    }

    /// Run one cycle against `prev` and return the state to publish.
    ///
    /// # Errors
    /// Non-finite samples or scores, or a panic raised by a collaborator
    /// (`DetectionError::TickPanicked`). Nothing is published by the engine
    /// itself; the caller decides.
    pub fn tick(&mut self, prev: &DetectionState) -> Result<TickOutcome> {
        match catch_unwind(AssertUnwindSafe(|| self.tick_inner(prev))) {
            Ok(r) => r,
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(eyre::Report::new(DetectionError::TickPanicked(msg)))
            }
        }
    }

    fn tick_inner(&mut self, prev: &DetectionState) -> Result<TickOutcome> {
        let position = self.signal.evaluate();
        let motion = self.analyzer.analyze(&self.buffers)?;
        let network = self.network.evaluate();
        let fused = self
            .fusion
            .fuse(position.score, motion.combined, network)?;

        tracing::debug!(
            signal_loss = position.score,
            motion = motion.combined,
            vibration = motion.vibration,
            rotation = motion.rotation,
            consistency = motion.consistency,
            network,
            confidence = fused.confidence,
            detected = fused.detected,
            "tick"
        );

        let fix = position.fix();
        Ok(TickOutcome {
            state: DetectionState::ticked(prev, fused, fix),
            scores: TickScores {
                signal_loss: position.score,
                position: position.outcome,
                motion,
                network,
            },
        })
    }

    pub fn buffers(&self) -> &Arc<MotionBuffers> {
        &self.buffers
    }
}
