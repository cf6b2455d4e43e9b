//! Scripted positioning provider.

use std::collections::VecDeque;
use std::time::Duration;

use ridewatch_traits::{Location, PositionProvider, ProviderError};

use crate::error::SimError;
use crate::scenario::Scenario;

/// Seoul City Hall; the default simulated street position.
pub const STREET: Location = Location {
    latitude: 37.5665,
    longitude: 126.978,
};

/// One scripted answer.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionStep {
    Fix(Location),
    NoFix,
    Fail(String),
    /// Take this long to answer; if it is not shorter than the caller's
    /// timeout the call gives up at the timeout with `SimError::Timeout`.
    Stall(Duration, Location),
}

/// Plays `script` in order, then repeats `then` forever.
#[derive(Debug, Clone)]
pub struct ScriptedPositionProvider {
    script: VecDeque<PositionStep>,
    then: PositionStep,
    calls: u64,
}

impl ScriptedPositionProvider {
    pub fn new(script: impl IntoIterator<Item = PositionStep>, then: PositionStep) -> Self {
        Self {
            script: script.into_iter().collect(),
            then,
            calls: 0,
        }
    }

    pub fn always(step: PositionStep) -> Self {
        Self::new([], step)
    }

    /// Street fixes for stationary and walking; a couple of fixes on the
    /// platform and then silence underground.
    pub fn for_scenario(scenario: Scenario) -> Self {
        match scenario {
            Scenario::Stationary | Scenario::Walking => Self::always(PositionStep::Fix(STREET)),
            Scenario::Subway => Self::new(
                [PositionStep::Fix(STREET), PositionStep::Fix(STREET)],
                PositionStep::NoFix,
            ),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl PositionProvider for ScriptedPositionProvider {
    fn current_fix(&mut self, timeout: Duration) -> Result<Option<Location>, ProviderError> {
        self.calls += 1;
        let step = self.script.pop_front().unwrap_or_else(|| self.then.clone());
        match step {
            PositionStep::Fix(loc) => Ok(Some(loc)),
            PositionStep::NoFix => Ok(None),
            PositionStep::Fail(msg) => Err(Box::new(SimError::Unavailable(msg))),
            PositionStep::Stall(d, loc) => {
                if d < timeout {
                    std::thread::sleep(d);
                    Ok(Some(loc))
                } else {
                    std::thread::sleep(timeout);
                    tracing::debug!(timeout_ms = timeout.as_millis() as u64, "simulated fix stalled");
                    Err(Box::new(SimError::Timeout))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_millis(20);

    #[test]
    fn script_then_fallback() {
        let mut p = ScriptedPositionProvider::for_scenario(Scenario::Subway);
        assert_eq!(p.current_fix(T).unwrap(), Some(STREET));
        assert_eq!(p.current_fix(T).unwrap(), Some(STREET));
        for _ in 0..5 {
            assert_eq!(p.current_fix(T).unwrap(), None);
        }
        assert_eq!(p.calls(), 7);
    }

    #[test]
    fn failures_are_typed() {
        let mut p = ScriptedPositionProvider::always(PositionStep::Fail("permission denied".into()));
        let err = p.current_fix(T).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SimError>(),
            Some(SimError::Unavailable(m)) if m == "permission denied"
        ));
    }

    #[test]
    fn stall_past_timeout_gives_up() {
        let mut p = ScriptedPositionProvider::always(PositionStep::Stall(Duration::from_secs(5), STREET));
        let started = std::time::Instant::now();
        let err = p.current_fix(T).unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(matches!(err.downcast_ref::<SimError>(), Some(SimError::Timeout)));
    }

    #[test]
    fn short_stall_still_answers() {
        let mut p =
            ScriptedPositionProvider::always(PositionStep::Stall(Duration::from_millis(1), STREET));
        assert_eq!(p.current_fix(T).unwrap(), Some(STREET));
    }
}
