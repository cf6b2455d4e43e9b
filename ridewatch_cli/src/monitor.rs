//! `monitor` and `self-check`: wire the detector to simulated collaborators,
//! run it, and print every published state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::WrapErr;
use ridewatch_core::util::{duration_ms, write_atomic};
use ridewatch_core::{DetectionConfig, DetectionController, DetectionState, Subscription};
use ridewatch_sim::{
    ReplayMotionSource, Scenario, ScenarioMotionSource, ScriptedNetworkProvider,
    ScriptedPositionProvider,
};
use ridewatch_traits::MotionSource;
use serde_json::json;

/// Upper bound on one wait for a state, so Ctrl-C is noticed promptly.
const POLL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct MonitorArgs {
    pub scenario: Scenario,
    pub duration_ms: Option<u64>,
    pub motion_csv: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
}

fn build_controller<M>(
    cfg: &ridewatch_config::Config,
    motion: M,
    scenario: Scenario,
) -> eyre::Result<DetectionController>
where
    M: MotionSource + Send + 'static,
{
    DetectionController::builder()
        .with_config(DetectionConfig::from(cfg))
        .with_motion_source(motion)
        .with_position_provider(ScriptedPositionProvider::for_scenario(scenario))
        .with_network_provider(ScriptedNetworkProvider::for_scenario(scenario))
        .build()
}

pub fn state_json(state: &DetectionState, elapsed_ms: u64) -> serde_json::Value {
    json!({
        "elapsed_ms": elapsed_ms,
        "is_monitoring": state.is_monitoring,
        "subway_detected": state.subway_detected,
        "confidence": state.confidence,
        "reason": state.reason,
        "last_known_location": state.last_known_location.map(|l| json!({
            "latitude": l.latitude,
            "longitude": l.longitude,
        })),
    })
}

fn render_state(state: &DetectionState, elapsed_ms: u64) -> String {
    let phase = if state.is_monitoring { "monitoring" } else { "stopped" };
    let verdict = if state.subway_detected { "SUBWAY" } else { "-" };
    let location = state
        .last_known_location
        .map(|l| format!(" @ {:.5},{:.5}", l.latitude, l.longitude))
        .unwrap_or_default();
    format!(
        "[{elapsed_ms:>6} ms] {phase:<10} {verdict:<6} confidence={:.2} reason=\"{}\"{location}",
        state.confidence, state.reason
    )
}

#[derive(Debug, Default)]
struct Summary {
    states: usize,
    ticks: usize,
    detections: usize,
    max_confidence: f32,
    first_detection_ms: Option<u64>,
}

struct Printer<'a> {
    json: bool,
    state_file: Option<&'a Path>,
    started: Instant,
    summary: Summary,
}

impl Printer<'_> {
    fn emit(&mut self, state: &DetectionState) -> eyre::Result<()> {
        let elapsed_ms = duration_ms(self.started.elapsed());
        let value = state_json(state, elapsed_ms);
        if self.json {
            println!("{value}");
        } else {
            println!("{}", render_state(state, elapsed_ms));
        }
        if let Some(path) = self.state_file {
            write_atomic(path, value.to_string().as_bytes())
                .wrap_err_with(|| format!("write state file {}", path.display()))?;
        }

        let s = &mut self.summary;
        s.states += 1;
        if state.is_monitoring && state.reason != ridewatch_core::fusion::REASON_STARTED {
            s.ticks += 1;
            s.max_confidence = s.max_confidence.max(state.confidence);
            if state.subway_detected {
                s.detections += 1;
                if s.first_detection_ms.is_none() {
                    s.first_detection_ms = Some(elapsed_ms);
                }
            }
        }
        Ok(())
    }

    fn finish(&self, scenario: Scenario) {
        let s = &self.summary;
        if self.json {
            println!(
                "{}",
                json!({ "summary": {
                    "scenario": scenario.name(),
                    "states": s.states,
                    "ticks": s.ticks,
                    "detections": s.detections,
                    "max_confidence": s.max_confidence,
                    "first_detection_ms": s.first_detection_ms,
                }})
            );
        } else {
            let first = s
                .first_detection_ms
                .map_or_else(|| "never".to_string(), |ms| format!("at {ms} ms"));
            println!(
                "summary: scenario={} ticks={} detections={} max_confidence={:.2} first_detection={first}",
                scenario.name(),
                s.ticks,
                s.detections,
                s.max_confidence
            );
        }
    }
}

/// Print states until the deadline passes, Ctrl-C is pressed or the
/// publisher goes away.
fn pump(
    sub: &Subscription,
    printer: &mut Printer<'_>,
    deadline: Option<Instant>,
    shutdown: &AtomicBool,
) -> eyre::Result<()> {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("interrupted; stopping");
            return Ok(());
        }
        let wait = match deadline {
            Some(d) => {
                let now = Instant::now();
                if now >= d {
                    return Ok(());
                }
                (d - now).min(POLL)
            }
            None => POLL,
        };
        match sub.rx.recv_timeout(wait) {
            Ok(state) => printer.emit(&state)?,
            Err(e) if e.is_timeout() => {}
            Err(_) => return Ok(()),
        }
    }
}

pub fn run_monitor(
    cfg: &ridewatch_config::Config,
    args: &MonitorArgs,
    json: bool,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<()> {
    let mut controller = match &args.motion_csv {
        Some(path) => {
            let records = ridewatch_config::load_motion_csv(path)?;
            tracing::info!(records = records.len(), path = %path.display(), "replaying motion trace");
            build_controller(
                cfg,
                ReplayMotionSource::new(records, cfg.simulation.motion_hz, true),
                args.scenario,
            )?
        }
        None => build_controller(
            cfg,
            ScenarioMotionSource::new(args.scenario, cfg.simulation.motion_hz, cfg.simulation.seed),
            args.scenario,
        )?,
    };

    let sub = controller.subscribe();
    // The replayed idle state is not part of the run.
    let _ = sub.rx.try_recv();

    let mut printer = Printer {
        json,
        state_file: args.state_file.as_deref(),
        started: Instant::now(),
        summary: Summary::default(),
    };
    let deadline = args
        .duration_ms
        .map(|ms| printer.started + Duration::from_millis(ms));

    tracing::info!(scenario = %args.scenario, duration_ms = ?args.duration_ms, "monitor start");
    controller.start()?;

    let outcome = pump(&sub, &mut printer, deadline, shutdown);

    // Stop even when printing failed, then report whatever was published.
    let stopped = controller.stop();
    while let Ok(state) = sub.rx.try_recv() {
        printer.emit(&state)?;
    }
    controller.cleanup()?;
    outcome?;
    stopped?;

    printer.finish(args.scenario);
    tracing::info!(ticks = printer.summary.ticks, detections = printer.summary.detections, "monitor done");
    Ok(())
}

/// Build the controller from the configuration, run one start/stop cycle and
/// release it.
pub fn self_check(cfg: &ridewatch_config::Config, json: bool) -> eyre::Result<()> {
    let scenario = Scenario::Stationary;
    let mut controller = build_controller(
        cfg,
        ScenarioMotionSource::new(scenario, cfg.simulation.motion_hz, cfg.simulation.seed),
        scenario,
    )
    .wrap_err("assemble detector")?;

    controller.start().wrap_err("start monitoring")?;
    controller.stop().wrap_err("stop monitoring")?;
    let state = controller.current_state();
    if state.is_monitoring {
        eyre::bail!("controller still reports monitoring after stop");
    }
    controller.cleanup()?;
    if !controller.is_terminated() {
        eyre::bail!("controller did not terminate on cleanup");
    }

    let dc = DetectionConfig::from(cfg);
    if json {
        println!(
            "{}",
            json!({
                "status": "ok",
                "tick_interval_ms": dc.tick_interval_ms,
                "min_detection_samples": dc.min_detection_samples,
                "confidence_threshold": dc.detection_confidence_threshold,
            })
        );
    } else {
        println!(
            "self-check: ok (tick every {} ms, window {} samples, threshold {:.2})",
            dc.tick_interval_ms, dc.min_detection_samples, dc.detection_confidence_threshold
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridewatch_core::Location;

    #[test]
    fn json_state_carries_location_or_null() {
        let mut s = DetectionState {
            is_monitoring: true,
            confidence: 0.5,
            reason: "normal state".into(),
            ..DetectionState::default()
        };
        let v = state_json(&s, 12);
        assert_eq!(v["elapsed_ms"], 12);
        assert!(v["last_known_location"].is_null());

        s.last_known_location = Some(Location::new(1.5, 2.5));
        let v = state_json(&s, 0);
        assert_eq!(v["last_known_location"]["latitude"], 1.5);
        assert_eq!(v["reason"], "normal state");
    }

    #[test]
    fn rendered_line_marks_detection() {
        let s = DetectionState {
            is_monitoring: true,
            subway_detected: true,
            confidence: 0.76,
            reason: "detected: weak positioning".into(),
            last_known_location: None,
        };
        let line = render_state(&s, 40);
        assert!(line.contains("SUBWAY"));
        assert!(line.contains("confidence=0.76"));
    }
}
