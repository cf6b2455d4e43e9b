//! `analyze`: score a recorded motion trace offline.
//!
//! The trace is fed through the same bounded buffers the live detector uses.
//! Every `min_detection_samples` accelerometer readings the newest window of
//! both sensors is scored.

use std::path::Path;

use ridewatch_config::{MotionRecord, TraceKind};
use ridewatch_core::{MotionPatternAnalyzer, MotionSample, MotionScores, SampleBuffer};
use serde_json::json;

/// Combined motion score above which a window is counted as transit-like.
const TRANSIT_LIKE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    /// Index of the trace record that closed the window.
    pub record: usize,
    pub scores: MotionScores,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceAnalysis {
    pub windows: Vec<WindowReport>,
    /// Windows the analyzer rejected, e.g. a reading whose magnitude overflows.
    pub skipped: usize,
}

impl TraceAnalysis {
    pub fn transit_like(&self) -> usize {
        self.windows
            .iter()
            .filter(|w| w.scores.combined > TRANSIT_LIKE)
            .count()
    }
}

/// Score the trace window by window. A window the analyzer rejects is
/// counted in `skipped` and the run carries on.
pub fn analyze_records(cfg: &ridewatch_config::Config, records: &[MotionRecord]) -> TraceAnalysis {
    let window = cfg.detection.min_detection_samples.max(1);
    let analyzer = MotionPatternAnalyzer::new(
        window,
        cfg.detection.accel_threshold,
        cfg.detection.gyro_threshold,
    );
    let mut accel = SampleBuffer::with_capacity(cfg.buffer.capacity);
    let mut gyro = SampleBuffer::with_capacity(cfg.buffer.capacity);
    let mut accel_seen = 0usize;
    let mut out = TraceAnalysis::default();

    for (idx, r) in records.iter().enumerate() {
        let sample = MotionSample::new(r.x, r.y, r.z);
        match r.kind {
            TraceKind::Accel => {
                accel.push(sample);
                accel_seen += 1;
            }
            TraceKind::Gyro => {
                gyro.push(sample);
                continue;
            }
        }
        if accel_seen % window != 0 {
            continue;
        }
        match analyzer.analyze_windows(&accel.last_n(window), &gyro.last_n(window)) {
            Ok(scores) if scores.ready => out.windows.push(WindowReport { record: idx, scores }),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(record = idx, error = %e, "window skipped");
                out.skipped += 1;
            }
        }
    }
    out
}

pub fn run_analyze(cfg: &ridewatch_config::Config, path: &Path, json: bool) -> eyre::Result<()> {
    let records = ridewatch_config::load_motion_csv(path)?;
    let analysis = analyze_records(cfg, &records);
    let reports = &analysis.windows;
    let transit = analysis.transit_like();
    tracing::info!(
        records = records.len(),
        windows = reports.len(),
        transit,
        skipped = analysis.skipped,
        "trace analyzed"
    );

    if json {
        for w in reports {
            println!(
                "{}",
                json!({
                    "record": w.record,
                    "vibration": w.scores.vibration,
                    "rotation": w.scores.rotation,
                    "consistency": w.scores.consistency,
                    "combined": w.scores.combined,
                    "accel_peaks": w.scores.accel_peaks,
                    "gyro_peaks": w.scores.gyro_peaks,
                })
            );
        }
        println!(
            "{}",
            json!({ "summary": {
                "records": records.len(),
                "windows": reports.len(),
                "transit_like_windows": transit,
                "skipped_windows": analysis.skipped,
            }})
        );
    } else {
        println!("record  vibration  rotation  consistency  combined  peaks(a/g)");
        for w in reports {
            let s = &w.scores;
            println!(
                "{:>6}  {:>9.2}  {:>8.2}  {:>11.2}  {:>8.2}  {}/{}",
                w.record, s.vibration, s.rotation, s.consistency, s.combined, s.accel_peaks, s.gyro_peaks
            );
        }
        let skipped = match analysis.skipped {
            0 => String::new(),
            n => format!(", {n} skipped"),
        };
        println!(
            "{} records, {} windows, {} transit-like{}",
            records.len(),
            reports.len(),
            transit,
            skipped
        );
    }
    Ok(())
}
