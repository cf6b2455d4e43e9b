//! Type-state builder for `DetectionController`.
//!
//! The builder enforces at compile time that a motion source, a position
//! provider and a network provider are supplied before `build()` is
//! available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use ridewatch_traits::{Clock, MonotonicClock, MotionSource, NetworkSnapshotProvider, PositionProvider};

use crate::analyzer::MotionPatternAnalyzer;
use crate::config::DetectionConfig;
use crate::controller::DetectionController;
use crate::engine::DetectionEngine;
use crate::error::{BuildError, DetectionError, Result};
use crate::fusion::ConfidenceFusionEngine;
use crate::network::NetworkChurnDetector;
use crate::sampler::MotionBuffers;
use crate::signal_loss::SignalLossDetector;

pub struct Missing;
pub struct Set;

pub struct DetectionControllerBuilder<M, P, N> {
    motion: Option<Box<dyn MotionSource + Send>>,
    position: Option<Box<dyn PositionProvider + Send>>,
    network: Option<Box<dyn NetworkSnapshotProvider + Send>>,
    config: Option<DetectionConfig>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    _m: PhantomData<M>,
    _p: PhantomData<P>,
    _n: PhantomData<N>,
}

impl Default for DetectionControllerBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            motion: None,
            position: None,
            network: None,
            config: None,
            clock: None,
            _m: PhantomData,
            _p: PhantomData,
            _n: PhantomData,
        }
    }
}

impl DetectionController {
    pub fn builder() -> DetectionControllerBuilder<Missing, Missing, Missing> {
        DetectionControllerBuilder::default()
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Reject configurations the engine cannot run with. The TOML layer performs
/// the same checks with richer messages; this guards direct construction.
pub fn validate(cfg: &DetectionConfig) -> Result<()> {
    if !(cfg.accel_threshold.is_finite() && cfg.accel_threshold > 0.0) {
        return Err(invalid("accel_threshold must be > 0"));
    }
    if !(cfg.gyro_threshold.is_finite() && cfg.gyro_threshold > 0.0) {
        return Err(invalid("gyro_threshold must be > 0"));
    }
    if cfg.min_detection_samples < 3 {
        return Err(invalid("min_detection_samples must be >= 3"));
    }
    if !(cfg.detection_confidence_threshold > 0.0 && cfg.detection_confidence_threshold < 1.0) {
        return Err(invalid("detection_confidence_threshold must be in (0, 1)"));
    }
    if cfg.position_loss_threshold_ms == 0 {
        return Err(invalid("position_loss_threshold_ms must be >= 1"));
    }
    if cfg.tick_interval_ms == 0 {
        return Err(invalid("tick_interval_ms must be >= 1"));
    }
    if cfg.error_backoff_ms < cfg.tick_interval_ms {
        return Err(invalid("error_backoff_ms must be >= tick_interval_ms"));
    }
    if cfg.position_timeout_ms == 0 {
        return Err(invalid("position_timeout_ms must be >= 1"));
    }
    if cfg.position_timeout_ms >= cfg.tick_interval_ms {
        return Err(invalid("position_timeout_ms must be < tick_interval_ms"));
    }
    if cfg.sample_buffer_capacity < cfg.min_detection_samples {
        return Err(invalid("sample_buffer_capacity must be >= min_detection_samples"));
    }
    let w = cfg.fusion_weights;
    let weights = [w.signal_loss, w.motion, w.network];
    if weights.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(invalid("fusion weights must be finite and >= 0"));
    }
    if weights.iter().all(|v| *v == 0.0) {
        return Err(invalid("fusion weights must not all be zero"));
    }
    Ok(())
}

impl<M, P, N> DetectionControllerBuilder<M, P, N> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<DetectionController> {
        let motion = self
            .motion
            .ok_or_else(|| eyre::Report::new(BuildError::MissingMotionSource))?;
        let position = self
            .position
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPositionProvider))?;
        let network = self
            .network
            .ok_or_else(|| eyre::Report::new(BuildError::MissingNetworkProvider))?;
        let cfg = self.config.unwrap_or_default();
        validate(&cfg)?;

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };

        let buffers = Arc::new(MotionBuffers::new(cfg.sample_buffer_capacity));
        let engine = DetectionEngine::new(
            Arc::clone(&buffers),
            MotionPatternAnalyzer::new(
                cfg.min_detection_samples,
                cfg.accel_threshold,
                cfg.gyro_threshold,
            ),
            SignalLossDetector::new(
                position,
                clock,
                cfg.position_loss_threshold_ms,
                cfg.position_timeout(),
            )
            .map_err(|e| {
                eyre::Report::new(DetectionError::State(format!(
                    "spawn position worker: {e}"
                )))
            })?,
            NetworkChurnDetector::new(network),
            ConfidenceFusionEngine::new(cfg.fusion_weights, cfg.detection_confidence_threshold),
        );
        Ok(DetectionController::new(cfg, buffers, motion, engine))
    }

    pub fn with_config(mut self, config: DetectionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<P, N> DetectionControllerBuilder<Missing, P, N> {
    pub fn with_motion_source(
        self,
        motion: impl MotionSource + Send + 'static,
    ) -> DetectionControllerBuilder<Set, P, N> {
        DetectionControllerBuilder {
            motion: Some(Box::new(motion)),
            position: self.position,
            network: self.network,
            config: self.config,
            clock: self.clock,
            _m: PhantomData,
            _p: PhantomData,
            _n: PhantomData,
        }
    }
}

impl<M, N> DetectionControllerBuilder<M, Missing, N> {
    pub fn with_position_provider(
        self,
        position: impl PositionProvider + Send + 'static,
    ) -> DetectionControllerBuilder<M, Set, N> {
        DetectionControllerBuilder {
            motion: self.motion,
            position: Some(Box::new(position)),
            network: self.network,
            config: self.config,
            clock: self.clock,
            _m: PhantomData,
            _p: PhantomData,
            _n: PhantomData,
        }
    }
}

impl<M, P> DetectionControllerBuilder<M, P, Missing> {
    pub fn with_network_provider(
        self,
        network: impl NetworkSnapshotProvider + Send + 'static,
    ) -> DetectionControllerBuilder<M, P, Set> {
        DetectionControllerBuilder {
            motion: self.motion,
            position: self.position,
            network: Some(Box::new(network)),
            config: self.config,
            clock: self.clock,
            _m: PhantomData,
            _p: PhantomData,
            _n: PhantomData,
        }
    }
}

impl DetectionControllerBuilder<Set, Set, Set> {
    /// Infallible with respect to missing collaborators; config is still validated.
    pub fn build(self) -> Result<DetectionController> {
        self.try_build()
    }
}
