//! `From` implementations bridging `ridewatch_config` types to `ridewatch_core` types.

use crate::config::{DetectionConfig, FusionWeights};

impl From<&ridewatch_config::Config> for DetectionConfig {
    fn from(c: &ridewatch_config::Config) -> Self {
        Self {
            accel_threshold: c.detection.accel_threshold,
            gyro_threshold: c.detection.gyro_threshold,
            position_loss_threshold_ms: c.detection.position_loss_threshold_ms,
            min_detection_samples: c.detection.min_detection_samples,
            detection_confidence_threshold: c.detection.confidence_threshold,
            tick_interval_ms: c.timing.tick_interval_ms,
            error_backoff_ms: c.timing.error_backoff_ms,
            position_timeout_ms: c.timing.position_timeout_ms,
            sample_buffer_capacity: c.buffer.capacity,
            fusion_weights: FusionWeights::from(c.fusion.weights),
        }
    }
}
