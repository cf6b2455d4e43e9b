#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and motion-trace parsing for the ride detector.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//!   Every section is optional; missing keys fall back to the stock tuning.
//! - Motion traces are CSV files with a strict `kind,x,y,z` header, used to
//!   replay recorded sensor sessions.
use serde::Deserialize;
use serde::de::Deserializer;

/// Motion trace CSV schema.
///
/// Expected headers:
/// kind,x,y,z
///
/// Example:
/// kind,x,y,z
/// accel,0.12,0.40,11.62
/// gyro,0.31,0.05,0.22
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct MotionRecord {
    pub kind: TraceKind,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Accel,
    Gyro,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Detection {
    /// Acceleration magnitude counted as a peak (m/s²); diagnostics only.
    pub accel_threshold: f32,
    /// Angular-rate magnitude counted as a peak (rad/s); diagnostics only.
    pub gyro_threshold: f32,
    /// Samples required in each motion buffer before motion is scored.
    pub min_detection_samples: usize,
    /// Fused confidence above which a ride is reported.
    pub confidence_threshold: f32,
    /// Positioning silence after which loss is considered sustained.
    pub position_loss_threshold_ms: u64,
}

impl Default for Detection {
    fn default() -> Self {
        Self {
            accel_threshold: 12.0,
            gyro_threshold: 2.0,
            min_detection_samples: 10,
            confidence_threshold: 0.7,
            position_loss_threshold_ms: 30_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Wait between two ticks (ms).
    pub tick_interval_ms: u64,
    /// Wait after a failed tick (ms).
    pub error_backoff_ms: u64,
    /// Budget for one positioning call (ms). Must stay below the tick interval.
    pub position_timeout_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2_000,
            error_backoff_ms: 5_000,
            position_timeout_ms: 1_500,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Fusion {
    /// Weights for (signal loss, motion pattern, network churn). Accepts either:
    /// - array: [0.4, 0.5, 0.1]
    /// - table: { signal_loss = 0.4, motion = 0.5, network = 0.1 }
    #[serde(deserialize_with = "de_weights")]
    pub weights: [f32; 3],
}

impl Default for Fusion {
    fn default() -> Self {
        Self {
            weights: [0.4, 0.5, 0.1],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Buffer {
    /// Samples retained per motion sensor.
    pub capacity: usize,
}

impl Default for Buffer {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Simulation {
    /// Event rate of the simulated motion source per sensor.
    pub motion_hz: u32,
    /// Seed for the simulated sensor noise.
    pub seed: u32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            motion_hz: 50,
            seed: 0x5EED,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub detection: Detection,
    pub timing: Timing,
    pub fusion: Fusion,
    pub buffer: Buffer,
    pub logging: Logging,
    pub simulation: Simulation,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WeightsToml {
    Array([f32; 3]),
    Table {
        signal_loss: f32,
        motion: f32,
        network: f32,
    },
}

fn de_weights<'de, D>(deserializer: D) -> Result<[f32; 3], D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match WeightsToml::deserialize(deserializer)? {
        WeightsToml::Array(w) => w,
        WeightsToml::Table {
            signal_loss,
            motion,
            network,
        } => [signal_loss, motion, network],
    })
}

pub fn load_motion_csv(path: &std::path::Path) -> eyre::Result<Vec<MotionRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open motion CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["kind", "x", "y", "z"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "motion CSV must have headers 'kind,x,y,z', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<MotionRecord>().enumerate() {
        match rec {
            Ok(row) => {
                if !(row.x.is_finite() && row.y.is_finite() && row.z.is_finite()) {
                    eyre::bail!("invalid CSV row {}: non-finite component", idx + 2);
                }
                rows.push(row);
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    if rows.is_empty() {
        eyre::bail!("motion CSV {:?} contains no samples", path);
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Detection
        if !(self.detection.accel_threshold.is_finite() && self.detection.accel_threshold > 0.0) {
            eyre::bail!("detection.accel_threshold must be > 0");
        }
        if !(self.detection.gyro_threshold.is_finite() && self.detection.gyro_threshold > 0.0) {
            eyre::bail!("detection.gyro_threshold must be > 0");
        }
        if self.detection.min_detection_samples < 3 {
            eyre::bail!("detection.min_detection_samples must be >= 3");
        }
        let thr = self.detection.confidence_threshold;
        if !(thr > 0.0 && thr < 1.0) {
            eyre::bail!("detection.confidence_threshold must be in (0.0, 1.0)");
        }
        if self.detection.position_loss_threshold_ms == 0 {
            eyre::bail!("detection.position_loss_threshold_ms must be >= 1");
        }

        // Timing
        if self.timing.tick_interval_ms == 0 {
            eyre::bail!("timing.tick_interval_ms must be >= 1");
        }
        if self.timing.error_backoff_ms < self.timing.tick_interval_ms {
            eyre::bail!("timing.error_backoff_ms must be >= timing.tick_interval_ms");
        }
        if self.timing.position_timeout_ms == 0 {
            eyre::bail!("timing.position_timeout_ms must be >= 1");
        }
        if self.timing.position_timeout_ms >= self.timing.tick_interval_ms {
            eyre::bail!("timing.position_timeout_ms must be < timing.tick_interval_ms");
        }
        if self.timing.tick_interval_ms > 10 * 60 * 1000 {
            eyre::bail!("timing.tick_interval_ms is unreasonably large (>10min)");
        }

        // Fusion
        for w in self.fusion.weights {
            if !(w.is_finite() && w >= 0.0) {
                eyre::bail!("fusion.weights must be finite and >= 0");
            }
        }
        if self.fusion.weights.iter().sum::<f32>() <= 0.0 {
            eyre::bail!("fusion.weights must not all be zero");
        }

        // Buffer
        if self.buffer.capacity < self.detection.min_detection_samples {
            eyre::bail!("buffer.capacity must be >= detection.min_detection_samples");
        }

        // Simulation
        if self.simulation.motion_hz == 0 {
            eyre::bail!("simulation.motion_hz must be > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
