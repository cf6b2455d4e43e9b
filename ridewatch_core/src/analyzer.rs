//! Motion pattern analysis over the newest sample window.
//!
//! Three heuristics look for the signature of a train carriage: a strong,
//! steady vibration floor, moderate rotation from curves and braking, and a
//! magnitude series that stays close to its own short-term average.

use crate::buffer::MotionSample;
use crate::error::{DetectionError, Result};
use crate::sampler::MotionBuffers;
use crate::util::{mean, mean_sq_dev, variance};
use ridewatch_traits::MotionKind;

/// Width of the moving average used by the consistency heuristic.
const CONSISTENCY_WINDOW: usize = 3;

/// Sub-scores of one analysis pass. `combined` is their mean, or 0 when the
/// buffers did not hold a full window yet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionScores {
    pub vibration: f32,
    pub rotation: f32,
    pub consistency: f32,
    pub combined: f32,
    /// Acceleration magnitudes above `accel_threshold` in the window.
    pub accel_peaks: usize,
    /// Angular-rate magnitudes above `gyro_threshold` in the window.
    pub gyro_peaks: usize,
    /// False when the window was not full and the neutral score was returned.
    pub ready: bool,
}

#[derive(Debug, Clone)]
pub struct MotionPatternAnalyzer {
    window: usize,
    accel_threshold: f32,
    gyro_threshold: f32,
}

impl MotionPatternAnalyzer {
    pub fn new(window: usize, accel_threshold: f32, gyro_threshold: f32) -> Self {
        Self {
            window: window.max(1),
            accel_threshold,
            gyro_threshold,
        }
    }

    /// Score the newest window of both buffers.
    pub fn analyze(&self, buffers: &MotionBuffers) -> Result<MotionScores> {
        let accel = buffers.window(MotionKind::Accel, self.window);
        let gyro = buffers.window(MotionKind::Gyro, self.window);
        self.analyze_windows(&accel, &gyro)
    }

    /// Score explicit windows. Either window shorter than the configured size
    /// yields the neutral score. Non-finite samples are an error.
    pub fn analyze_windows(
        &self,
        accel: &[MotionSample],
        gyro: &[MotionSample],
    ) -> Result<MotionScores> {
        if accel.len() < self.window || gyro.len() < self.window {
            return Ok(MotionScores::default());
        }

        let accel_mag = magnitudes(accel, "acceleration")?;
        let gyro_mag = magnitudes(gyro, "angular rate")?;

        let vibration = vibration_score(&accel_mag);
        let rotation = rotation_score(&gyro_mag);
        let consistency = consistency_score(&accel_mag);

        Ok(MotionScores {
            vibration,
            rotation,
            consistency,
            combined: (vibration + rotation + consistency) / 3.0,
            accel_peaks: accel_mag
                .iter()
                .filter(|&&m| m > self.accel_threshold)
                .count(),
            gyro_peaks: gyro_mag.iter().filter(|&&m| m > self.gyro_threshold).count(),
            ready: true,
        })
    }
}

fn magnitudes(samples: &[MotionSample], what: &'static str) -> Result<Vec<f32>> {
    samples
        .iter()
        .map(|s| {
            let m = s.magnitude();
            if m.is_finite() {
                Ok(m)
            } else {
                Err(eyre::Report::new(DetectionError::NonFiniteSample(what)))
            }
        })
        .collect()
}

/// Vibration floor from acceleration magnitudes.
pub fn vibration_score(accel_mag: &[f32]) -> f32 {
    let avg = mean(accel_mag);
    let var = variance(accel_mag);
    if avg > 11.0 && var < 4.0 {
        0.8
    } else if avg > 9.5 && var < 6.0 {
        0.6
    } else if avg < 9.2 {
        // resting on gravity alone
        0.1
    } else {
        0.3
    }
}

/// Rotation activity from angular-rate magnitudes. An empty window has zero
/// peak and zero mean rotation.
pub fn rotation_score(gyro_mag: &[f32]) -> f32 {
    let max_r = gyro_mag.iter().copied().fold(0.0_f32, f32::max);
    let avg_r = mean(gyro_mag);
    if max_r > 1.5 && avg_r > 0.3 {
        0.7
    } else if max_r > 1.0 && avg_r > 0.2 {
        0.5
    } else if avg_r < 0.1 {
        0.1
    } else {
        0.3
    }
}

/// Spread of the magnitudes around each point of their 3-wide moving average.
pub fn consistency_score(accel_mag: &[f32]) -> f32 {
    let spreads: Vec<f32> = accel_mag
        .windows(CONSISTENCY_WINDOW)
        .map(|w| mean_sq_dev(accel_mag, mean(w)))
        .collect();
    if spreads.is_empty() {
        return 0.1;
    }
    let v = mean(&spreads);
    if v < 2.0 {
        0.8
    } else if v < 4.0 {
        0.6
    } else if v < 8.0 {
        0.3
    } else {
        0.1
    }
}
