//! Runtime configuration for the detection engine.
//!
//! Separate from the TOML-deserialized config in `ridewatch_config`; see
//! `conversions` for the mapping.

use std::time::Duration;

/// Weights applied to (signal loss, motion pattern, network churn).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub signal_loss: f32,
    pub motion: f32,
    pub network: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            signal_loss: 0.4,
            motion: 0.5,
            network: 0.1,
        }
    }
}

impl From<[f32; 3]> for FusionWeights {
    fn from(w: [f32; 3]) -> Self {
        Self {
            signal_loss: w[0],
            motion: w[1],
            network: w[2],
        }
    }
}

/// Every tunable of the engine. Passed at construction; never global.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Acceleration magnitude counted as a peak (m/s²). Diagnostics only.
    pub accel_threshold: f32,
    /// Angular-rate magnitude counted as a peak (rad/s). Diagnostics only.
    pub gyro_threshold: f32,
    /// Positioning silence after which loss is considered sustained (ms).
    pub position_loss_threshold_ms: u64,
    /// Samples required in each buffer before motion is scored; also the window size.
    pub min_detection_samples: usize,
    /// Fused confidence strictly above which a ride is reported.
    pub detection_confidence_threshold: f32,
    /// Wait between ticks (ms).
    pub tick_interval_ms: u64,
    /// Wait after a failed tick (ms).
    pub error_backoff_ms: u64,
    /// Budget for one positioning call (ms).
    pub position_timeout_ms: u64,
    /// Samples retained per motion sensor.
    pub sample_buffer_capacity: usize,
    pub fusion_weights: FusionWeights,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            accel_threshold: 12.0,
            gyro_threshold: 2.0,
            position_loss_threshold_ms: 30_000,
            min_detection_samples: 10,
            detection_confidence_threshold: 0.7,
            tick_interval_ms: 2_000,
            error_backoff_ms: 5_000,
            position_timeout_ms: 1_500,
            sample_buffer_capacity: 50,
            fusion_weights: FusionWeights::default(),
        }
    }
}

impl DetectionConfig {
    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    #[inline]
    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    #[inline]
    pub fn position_timeout(&self) -> Duration {
        Duration::from_millis(self.position_timeout_ms)
    }
}
