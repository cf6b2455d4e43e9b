//! Positioning-loss scoring.
//!
//! Underground, fixes stop arriving. The longer the provider stays silent the
//! more likely the rider is below ground; a provider that errors or stalls is
//! treated as mildly suspicious rather than as proof either way.
//!
//! The provider lives on its own `ridewatch-position` thread. Each evaluation
//! sends one request and waits at most the position timeout for the answer,
//! so a provider that ignores its budget slows nothing but itself. While a
//! timed-out request is still running no new one is sent; its answer is
//! discarded when it finally arrives.

use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel as xch;
use ridewatch_traits::{Clock, Location, PositionProvider};

use crate::error::DetectionError;
use crate::provider_error::map_provider_error;
use crate::util::duration_ms;

/// Score when a fix was obtained.
pub const SCORE_FIX: f32 = 0.0;
/// Score when no fix arrived but the last one is recent.
pub const SCORE_BRIEF_LOSS: f32 = 0.3;
/// Score when the provider failed or overran its budget.
pub const SCORE_PROVIDER_FAILURE: f32 = 0.5;
/// Score when no fix has arrived for longer than the loss threshold.
pub const SCORE_SUSTAINED_LOSS: f32 = 0.8;

/// What the provider answered this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionOutcome {
    Fix(Location),
    /// No fix; milliseconds since the last one (`None` if never seen).
    NoFix { silent_ms: Option<u64> },
    Failed(DetectionError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionReading {
    pub score: f32,
    pub outcome: PositionOutcome,
}

impl PositionReading {
    pub fn fix(&self) -> Option<Location> {
        match self.outcome {
            PositionOutcome::Fix(loc) => Some(loc),
            _ => None,
        }
    }
}

/// Provider answer as produced on the positioning thread; `Err` carries the
/// payload of a panic raised by the provider.
type Answer = std::thread::Result<Result<Option<Location>, DetectionError>>;

/// Owns the provider on a dedicated thread. The thread exits once the
/// request sender is dropped and the current call (if any) has returned;
/// it is never joined, so a stalled provider cannot block a drop.
struct PositionWorker {
    requests: xch::Sender<Duration>,
    answers: xch::Receiver<Answer>,
    in_flight: bool,
}

impl PositionWorker {
    fn spawn(mut provider: Box<dyn PositionProvider + Send>) -> std::io::Result<Self> {
        let (requests, request_rx) = xch::bounded::<Duration>(1);
        let (answer_tx, answers) = xch::bounded::<Answer>(1);
        std::thread::Builder::new()
            .name("ridewatch-position".into())
            .spawn(move || {
                while let Ok(timeout) = request_rx.recv() {
                    let answer = catch_unwind(AssertUnwindSafe(|| {
                        provider
                            .current_fix(timeout)
                            .map_err(|e| map_provider_error(e.as_ref(), duration_ms(timeout)))
                    }));
                    if answer_tx.send(answer).is_err() {
                        break;
                    }
                }
                tracing::trace!("position worker exiting");
            })?;
        Ok(Self {
            requests,
            answers,
            in_flight: false,
        })
    }

    /// One bounded round trip. `None` when no answer arrived within
    /// `timeout`, including when an earlier request is still running.
    fn request(&mut self, timeout: Duration) -> Option<Answer> {
        if self.in_flight {
            match self.answers.try_recv() {
                Ok(_) => {
                    tracing::debug!("discarding late position answer");
                    self.in_flight = false;
                }
                Err(_) => {
                    tracing::debug!("position provider still busy with an earlier request");
                    return None;
                }
            }
        }
        if self.requests.send(timeout).is_err() {
            return Some(Ok(Err(DetectionError::State(
                "position worker is gone".into(),
            ))));
        }
        self.in_flight = true;
        match self.answers.recv_timeout(timeout) {
            Ok(answer) => {
                self.in_flight = false;
                Some(answer)
            }
            Err(_) => None,
        }
    }
}

pub struct SignalLossDetector {
    worker: PositionWorker,
    clock: Arc<dyn Clock + Send + Sync>,
    loss_threshold_ms: u64,
    timeout: Duration,
    last_fix_at: Option<Instant>,
}

impl core::fmt::Debug for SignalLossDetector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignalLossDetector")
            .field("loss_threshold_ms", &self.loss_threshold_ms)
            .field("timeout", &self.timeout)
            .field("last_fix_at", &self.last_fix_at)
            .field("in_flight", &self.worker.in_flight)
            .finish()
    }
}

impl SignalLossDetector {
    /// Moves `provider` onto its own thread.
    ///
    /// # Errors
    /// The positioning thread could not be spawned.
    pub fn new(
        provider: Box<dyn PositionProvider + Send>,
        clock: Arc<dyn Clock + Send + Sync>,
        loss_threshold_ms: u64,
        timeout: Duration,
    ) -> std::io::Result<Self> {
        Ok(Self {
            worker: PositionWorker::spawn(provider)?,
            clock,
            loss_threshold_ms,
            timeout,
            last_fix_at: None,
        })
    }

    /// Query the provider once, waiting at most the timeout, and score the
    /// answer. Provider errors and overruns map to `SCORE_PROVIDER_FAILURE`.
    /// A panic inside the provider is re-raised on the calling thread, so
    /// the tick fails as if the call had been made inline.
    pub fn evaluate(&mut self) -> PositionReading {
        let timeout_ms = duration_ms(self.timeout);
        let started = self.clock.now();
        let answer = match self.worker.request(self.timeout) {
            Some(Ok(answer)) => answer,
            Some(Err(payload)) => resume_unwind(payload),
            None => Err(DetectionError::ProviderTimeout(timeout_ms)),
        };
        let took_ms = self.clock.ms_since(started);

        let answer = match answer {
            Ok(_) if took_ms > timeout_ms => {
                // A late answer is stale; do not let it reset the loss timer.
                Err(DetectionError::ProviderTimeout(timeout_ms))
            }
            other => other,
        };

        match answer {
            Ok(Some(loc)) => {
                self.last_fix_at = Some(self.clock.now());
                PositionReading {
                    score: SCORE_FIX,
                    outcome: PositionOutcome::Fix(loc),
                }
            }
            Ok(None) => {
                let silent_ms = self.last_fix_at.map(|t| self.clock.ms_since(t));
                // Never having seen a fix counts as an unbounded silence.
                let sustained = silent_ms.is_none_or(|ms| ms > self.loss_threshold_ms);
                PositionReading {
                    score: if sustained {
                        SCORE_SUSTAINED_LOSS
                    } else {
                        SCORE_BRIEF_LOSS
                    },
                    outcome: PositionOutcome::NoFix { silent_ms },
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, took_ms, "position provider failed; using neutral-high score");
                PositionReading {
                    score: SCORE_PROVIDER_FAILURE,
                    outcome: PositionOutcome::Failed(err),
                }
            }
        }
    }

    /// Milliseconds since the last fix, if any fix was ever observed.
    pub fn silent_for_ms(&self) -> Option<u64> {
        self.last_fix_at.map(|t| self.clock.ms_since(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridewatch_traits::{ManualClock, ProviderError};
    use std::collections::VecDeque;

    enum Step {
        Fix,
        NoFix,
        Fail,
        SlowFix(Duration),
    }

    struct Scripted {
        steps: VecDeque<Step>,
        clock: ManualClock,
    }

    impl PositionProvider for Scripted {
        fn current_fix(&mut self, _timeout: Duration) -> Result<Option<Location>, ProviderError> {
            match self.steps.pop_front().unwrap_or(Step::NoFix) {
                Step::Fix => Ok(Some(Location::new(37.55, 126.97))),
                Step::NoFix => Ok(None),
                Step::Fail => Err("location permission denied".into()),
                Step::SlowFix(d) => {
                    self.clock.advance(d);
                    Ok(Some(Location::new(37.55, 126.97)))
                }
            }
        }
    }

    fn detector(steps: Vec<Step>, clock: &ManualClock) -> SignalLossDetector {
        SignalLossDetector::new(
            Box::new(Scripted {
                steps: steps.into(),
                clock: clock.clone(),
            }),
            Arc::new(clock.clone()),
            30_000,
            Duration::from_millis(1_500),
        )
        .unwrap()
    }

    #[test]
    fn fix_scores_zero_and_reports_location() {
        let clock = ManualClock::new();
        let mut d = detector(vec![Step::Fix], &clock);
        let r = d.evaluate();
        assert_eq!(r.score, SCORE_FIX);
        assert_eq!(r.fix(), Some(Location::new(37.55, 126.97)));
        assert_eq!(d.silent_for_ms(), Some(0));
    }

    #[test]
    fn no_fix_ever_counts_as_sustained_loss() {
        let clock = ManualClock::new();
        let mut d = detector(vec![Step::NoFix], &clock);
        let r = d.evaluate();
        assert_eq!(r.score, SCORE_SUSTAINED_LOSS);
        assert_eq!(r.outcome, PositionOutcome::NoFix { silent_ms: None });
    }

    #[test]
    fn loss_escalates_after_threshold() {
        let clock = ManualClock::new();
        let mut d = detector(vec![Step::Fix, Step::NoFix, Step::NoFix, Step::NoFix], &clock);
        assert_eq!(d.evaluate().score, SCORE_FIX);

        clock.advance(Duration::from_millis(10_000));
        assert_eq!(d.evaluate().score, SCORE_BRIEF_LOSS);

        // exactly at the threshold is not yet "exceeds"
        clock.advance(Duration::from_millis(20_000));
        assert_eq!(d.evaluate().score, SCORE_BRIEF_LOSS);

        clock.advance(Duration::from_millis(1));
        let r = d.evaluate();
        assert_eq!(r.score, SCORE_SUSTAINED_LOSS);
        assert_eq!(r.outcome, PositionOutcome::NoFix { silent_ms: Some(30_001) });
    }

    #[test]
    fn provider_error_scores_neutral_high() {
        let clock = ManualClock::new();
        let mut d = detector(vec![Step::Fail], &clock);
        let r = d.evaluate();
        assert_eq!(r.score, SCORE_PROVIDER_FAILURE);
        assert!(matches!(r.outcome, PositionOutcome::Failed(DetectionError::Provider(_))));
    }

    #[test]
    fn late_fix_is_treated_as_timeout_and_does_not_reset_timer() {
        let clock = ManualClock::new();
        let mut d = detector(vec![Step::SlowFix(Duration::from_millis(2_000))], &clock);
        let r = d.evaluate();
        assert_eq!(r.score, SCORE_PROVIDER_FAILURE);
        assert_eq!(r.outcome, PositionOutcome::Failed(DetectionError::ProviderTimeout(1_500)));
        assert_eq!(d.silent_for_ms(), None);
    }

    /// Sleeps on a real clock, ignoring the timeout it is given.
    struct Stalling {
        sleep: Duration,
        calls: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl PositionProvider for Stalling {
        fn current_fix(&mut self, _timeout: Duration) -> Result<Option<Location>, ProviderError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            std::thread::sleep(self.sleep);
            Ok(Some(Location::new(37.55, 126.97)))
        }
    }

    fn stalling(sleep: Duration, timeout: Duration) -> (SignalLossDetector, Arc<std::sync::atomic::AtomicUsize>) {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let d = SignalLossDetector::new(
            Box::new(Stalling {
                sleep,
                calls: Arc::clone(&calls),
            }),
            Arc::new(ridewatch_traits::MonotonicClock::new()),
            30_000,
            timeout,
        )
        .unwrap();
        (d, calls)
    }

    #[test]
    fn stalled_provider_is_cut_off_at_the_timeout() {
        let (mut d, calls) = stalling(Duration::from_secs(3), Duration::from_millis(20));
        let started = Instant::now();
        let r = d.evaluate();
        assert!(started.elapsed() < Duration::from_millis(500), "{:?}", started.elapsed());
        assert_eq!(r.outcome, PositionOutcome::Failed(DetectionError::ProviderTimeout(20)));
        assert_eq!(r.score, SCORE_PROVIDER_FAILURE);

        // Still busy: no second request is queued behind the stalled one.
        let r = d.evaluate();
        assert_eq!(r.score, SCORE_PROVIDER_FAILURE);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(d.silent_for_ms(), None);
    }

    #[test]
    fn late_answer_is_discarded_and_next_request_goes_through() {
        let (mut d, calls) = stalling(Duration::from_millis(60), Duration::from_millis(20));
        assert_eq!(d.evaluate().score, SCORE_PROVIDER_FAILURE);
        std::thread::sleep(Duration::from_millis(200));

        // The stale fix is dropped; the fresh request is the one scored.
        let r = d.evaluate();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(r.score, SCORE_PROVIDER_FAILURE);
        assert_eq!(d.silent_for_ms(), None);
    }

    #[test]
    fn provider_panic_resurfaces_on_caller() {
        struct Crashing;
        impl PositionProvider for Crashing {
            fn current_fix(&mut self, _t: Duration) -> Result<Option<Location>, ProviderError> {
                panic!("positioning daemon crashed");
            }
        }
        let clock = ManualClock::new();
        let mut d = SignalLossDetector::new(
            Box::new(Crashing),
            Arc::new(clock),
            30_000,
            Duration::from_millis(1_000),
        )
        .unwrap();
        let payload = catch_unwind(AssertUnwindSafe(|| d.evaluate())).unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"positioning daemon crashed"));
    }
}
