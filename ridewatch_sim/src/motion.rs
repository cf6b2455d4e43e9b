//! Simulated motion sources.
//!
//! Each registration spawns exactly one emitter thread that delivers an
//! accelerometer and a gyroscope reading per period. `unregister` (and drop)
//! signal the thread and join it, so once it returns the sink has received
//! its last event.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use ridewatch_config::{MotionRecord, TraceKind};
use ridewatch_traits::{Clock, MonotonicClock, MotionKind, MotionSink, MotionSource, ProviderError};

use crate::error::SimError;
use crate::scenario::{Scenario, XorShift32};

/// Period of one reading pair at `hz` (clamped to 1..=1000 Hz).
#[inline]
pub fn period(hz: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(hz.clamp(1, 1000)))
}

struct Emitter {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl Emitter {
    /// `next` returns the readings for one period, or `None` when exhausted.
    fn spawn<F>(sink: Arc<dyn MotionSink>, hz: u32, mut next: F) -> Result<Self, SimError>
    where
        F: FnMut(u64) -> Option<Vec<(MotionKind, f32, f32, f32)>> + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let period = period(hz);
        let clock = MonotonicClock::new();

        let join_handle = std::thread::Builder::new()
            .name("ridewatch-motion".into())
            .spawn(move || {
                let mut step = 0u64;
                loop {
                    if shutdown_clone.load(Ordering::Relaxed) {
                        tracing::debug!("motion emitter received shutdown signal");
                        break;
                    }
                    let Some(batch) = next(step) else {
                        tracing::debug!(step, "motion trace exhausted");
                        break;
                    };
                    for (kind, x, y, z) in batch {
                        sink.deliver(kind, x, y, z);
                    }
                    step += 1;
                    if shutdown_clone.load(Ordering::Relaxed) {
                        break;
                    }
                    clock.sleep(period);
                }
                tracing::trace!("motion emitter exiting cleanly");
            })?;

        Ok(Self {
            shutdown,
            join_handle: Some(join_handle),
        })
    }
}

impl Drop for Emitter {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("motion emitter joined"),
                Err(e) => tracing::warn!(?e, "motion emitter panicked during shutdown"),
            }
        }
    }
}

/// Endless synthetic motion for a `Scenario`.
pub struct ScenarioMotionSource {
    scenario: Scenario,
    hz: u32,
    seed: u32,
    emitter: Option<Emitter>,
}

impl std::fmt::Debug for ScenarioMotionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioMotionSource")
            .field("scenario", &self.scenario)
            .field("hz", &self.hz)
            .field("running", &self.emitter.is_some())
            .finish()
    }
}

impl ScenarioMotionSource {
    pub fn new(scenario: Scenario, hz: u32, seed: u32) -> Self {
        Self {
            scenario,
            hz,
            seed,
            emitter: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.emitter.is_some()
    }
}

impl MotionSource for ScenarioMotionSource {
    fn register(&mut self, sink: Arc<dyn MotionSink>) -> Result<(), ProviderError> {
        // Replacing the sink: stop the previous emitter first.
        self.emitter = None;
        let scenario = self.scenario;
        let mut rng = XorShift32::new(self.seed);
        let emitter = Emitter::spawn(sink, self.hz, move |step| {
            let (ax, ay, az) = scenario.motion(MotionKind::Accel, step, &mut rng);
            let (gx, gy, gz) = scenario.motion(MotionKind::Gyro, step, &mut rng);
            Some(vec![
                (MotionKind::Accel, ax, ay, az),
                (MotionKind::Gyro, gx, gy, gz),
            ])
        })?;
        self.emitter = Some(emitter);
        tracing::info!(scenario = %self.scenario, hz = self.hz, "motion source registered");
        Ok(())
    }

    fn unregister(&mut self) {
        if self.emitter.take().is_some() {
            tracing::info!(scenario = %self.scenario, "motion source unregistered");
        }
    }
}

/// Replays a recorded trace, one record per period. Stops at the end of the
/// trace unless looping.
pub struct ReplayMotionSource {
    records: Arc<[MotionRecord]>,
    hz: u32,
    looped: bool,
    emitter: Option<Emitter>,
}

impl std::fmt::Debug for ReplayMotionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayMotionSource")
            .field("records", &self.records.len())
            .field("hz", &self.hz)
            .field("looped", &self.looped)
            .finish()
    }
}

impl ReplayMotionSource {
    pub fn new(records: Vec<MotionRecord>, hz: u32, looped: bool) -> Self {
        Self {
            records: records.into(),
            hz,
            looped,
            emitter: None,
        }
    }
}

fn kind_of(k: TraceKind) -> MotionKind {
    match k {
        TraceKind::Accel => MotionKind::Accel,
        TraceKind::Gyro => MotionKind::Gyro,
    }
}

impl MotionSource for ReplayMotionSource {
    fn register(&mut self, sink: Arc<dyn MotionSink>) -> Result<(), ProviderError> {
        self.emitter = None;
        if self.records.is_empty() {
            return Err(Box::new(SimError::Unavailable("empty motion trace".into())));
        }
        let records = Arc::clone(&self.records);
        let looped = self.looped;
        let emitter = Emitter::spawn(sink, self.hz, move |step| {
            let len = records.len() as u64;
            if !looped && step >= len {
                return None;
            }
            let idx = usize::try_from(step % len).unwrap_or(0);
            let r = &records[idx];
            Some(vec![(kind_of(r.kind), r.x, r.y, r.z)])
        })?;
        self.emitter = Some(emitter);
        tracing::info!(records = self.records.len(), looped, "replay motion source registered");
        Ok(())
    }

    fn unregister(&mut self) {
        self.emitter = None;
    }
}
