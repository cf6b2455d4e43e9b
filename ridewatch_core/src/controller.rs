//! Monitoring lifecycle and the periodic tick worker.
//!
//! `start` spawns exactly one worker thread that owns the `DetectionEngine`
//! while monitoring. `stop` signals it through a channel (which also cuts the
//! inter-tick wait short), joins it to take the engine back, and only then
//! publishes the stopped state, so nothing from an earlier tick can land
//! after `stop` returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel as xch;
use ridewatch_traits::{MotionSink, MotionSource};

use crate::config::DetectionConfig;
use crate::engine::DetectionEngine;
use crate::error::{DetectionError, Result};
use crate::publisher::{StatePublisher, Subscription, SubscriptionId};
use crate::sampler::MotionBuffers;
use crate::state::DetectionState;
use crate::util::duration_ms;

struct Worker {
    /// Dropping the sender wakes the worker out of its wait.
    shutdown_tx: xch::Sender<()>,
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<DetectionEngine>,
}

enum Phase {
    Idle(Box<DetectionEngine>),
    Monitoring(Worker),
    Terminated,
}

pub struct DetectionController {
    config: DetectionConfig,
    buffers: Arc<MotionBuffers>,
    motion: Box<dyn MotionSource + Send>,
    publisher: Arc<StatePublisher>,
    phase: Phase,
}

impl core::fmt::Debug for DetectionController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let phase = match self.phase {
            Phase::Idle(_) => "idle",
            Phase::Monitoring(_) => "monitoring",
            Phase::Terminated => "terminated",
        };
        f.debug_struct("DetectionController")
            .field("phase", &phase)
            .field("buffers", &self.buffers)
            .field("tick_interval_ms", &self.config.tick_interval_ms)
            .finish()
    }
}

impl DetectionController {
    pub(crate) fn new(
        config: DetectionConfig,
        buffers: Arc<MotionBuffers>,
        motion: Box<dyn MotionSource + Send>,
        engine: DetectionEngine,
    ) -> Self {
        Self {
            config,
            buffers,
            motion,
            publisher: Arc::new(StatePublisher::new(DetectionState::default())),
            phase: Phase::Idle(Box::new(engine)),
        }
    }

    /// Begin monitoring. Calling it while already monitoring does nothing.
    ///
    /// # Errors
    /// `DetectionError::Terminated` after `cleanup`; a failure to spawn the
    /// worker thread (the controller is then terminated).
    pub fn start(&mut self) -> Result<()> {
        let mut engine = match std::mem::replace(&mut self.phase, Phase::Terminated) {
            Phase::Idle(engine) => engine,
            monitoring @ Phase::Monitoring(_) => {
                self.phase = monitoring;
                tracing::debug!("start ignored: already monitoring");
                return Ok(());
            }
            Phase::Terminated => {
                return Err(eyre::Report::new(DetectionError::Terminated));
            }
        };

        self.publisher
            .publish(DetectionState::started(&self.publisher.current()));

        self.buffers.clear();
        self.buffers.open();
        let sink: Arc<dyn MotionSink> = self.buffers.clone();
        if let Err(e) = self.motion.register(sink) {
            tracing::warn!(error = %e, "motion source registration failed; motion score stays neutral");
        }

        engine.prepare();

        let (shutdown_tx, shutdown_rx) = xch::bounded::<()>(0);
        let cancelled = Arc::new(AtomicBool::new(false));
        let spawned = {
            let publisher = Arc::clone(&self.publisher);
            let cancelled = Arc::clone(&cancelled);
            let interval = self.config.tick_interval();
            let backoff = self.config.error_backoff();
            std::thread::Builder::new()
                .name("ridewatch-tick".into())
                .spawn(move || {
                    run_worker(*engine, &publisher, &shutdown_rx, &cancelled, interval, backoff)
                })
        };

        match spawned {
            Ok(handle) => {
                self.phase = Phase::Monitoring(Worker {
                    shutdown_tx,
                    cancelled,
                    handle,
                });
                tracing::info!(
                    tick_interval_ms = self.config.tick_interval_ms,
                    "monitoring started"
                );
                Ok(())
            }
            Err(e) => {
                // The engine went down with the closure; nothing left to restart with.
                self.release_sensors();
                self.publisher
                    .publish(DetectionState::stopped(&self.publisher.current()));
                tracing::error!(error = %e, "failed to spawn tick worker");
                Err(eyre::Report::new(DetectionError::State(format!(
                    "spawn tick worker: {e}"
                ))))
            }
        }
    }

    /// End monitoring and publish the stopped state. Safe to call when idle.
    /// Waits for an in-flight tick, which is bounded by the position timeout.
    ///
    /// # Errors
    /// `DetectionError::State` if the worker thread died outside a tick; the
    /// stopped state is still published and the controller is terminated.
    pub fn stop(&mut self) -> Result<()> {
        let joined = match std::mem::replace(&mut self.phase, Phase::Terminated) {
            Phase::Monitoring(worker) => {
                worker.cancelled.store(true, Ordering::Release);
                drop(worker.shutdown_tx);
                Some(worker.handle.join())
            }
            Phase::Idle(engine) => {
                self.phase = Phase::Idle(engine);
                None
            }
            Phase::Terminated => return Ok(()),
        };

        self.release_sensors();
        self.publisher
            .publish(DetectionState::stopped(&self.publisher.current()));

        match joined {
            None => Ok(()),
            Some(Ok(engine)) => {
                self.phase = Phase::Idle(Box::new(engine));
                tracing::info!("monitoring stopped");
                Ok(())
            }
            Some(Err(e)) => {
                tracing::error!(?e, "tick worker panicked; controller terminated");
                Err(eyre::Report::new(DetectionError::State(
                    "tick worker panicked".into(),
                )))
            }
        }
    }

    /// Stop, then drop the engine and its collaborators for good. Any later
    /// `start` fails with `DetectionError::Terminated`.
    pub fn cleanup(&mut self) -> Result<()> {
        let stopped = self.stop();
        self.phase = Phase::Terminated;
        tracing::debug!("controller cleaned up");
        stopped
    }

    fn release_sensors(&mut self) {
        self.motion.unregister();
        self.buffers.close();
        self.buffers.clear();
    }

    /// See `StatePublisher::subscribe`: drain `rx` or unsubscribe.
    pub fn subscribe(&self) -> Subscription {
        self.publisher.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }

    pub fn current_state(&self) -> DetectionState {
        self.publisher.current()
    }

    pub fn is_monitoring(&self) -> bool {
        matches!(self.phase, Phase::Monitoring(_))
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, Phase::Terminated)
    }

    pub fn buffers(&self) -> &Arc<MotionBuffers> {
        &self.buffers
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }
}

impl Drop for DetectionController {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            tracing::warn!(error = %e, "cleanup on drop failed");
        }
    }
}

/// Tick immediately, then every `interval`; after a failed tick wait
/// `backoff` instead. Returns the engine when told to stop.
fn run_worker(
    mut engine: DetectionEngine,
    publisher: &StatePublisher,
    shutdown: &xch::Receiver<()>,
    cancelled: &AtomicBool,
    interval: Duration,
    backoff: Duration,
) -> DetectionEngine {
    let mut wait = Duration::ZERO;
    loop {
        match shutdown.recv_timeout(wait) {
            Err(xch::RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(xch::RecvTimeoutError::Disconnected) => break,
        }
        if cancelled.load(Ordering::Acquire) {
            break;
        }

        match engine.tick(&publisher.current()) {
            Ok(outcome) => {
                if cancelled.load(Ordering::Acquire) {
                    break;
                }
                publisher.publish(outcome.state);
                wait = interval;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    backoff_ms = duration_ms(backoff),
                    "tick failed; skipping publish"
                );
                wait = backoff;
            }
        }
    }
    tracing::trace!("tick worker exiting");
    engine
}
