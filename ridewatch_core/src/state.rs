//! Published detection state.

use ridewatch_traits::Location;

use crate::fusion::{Fused, REASON_STARTED, REASON_STOPPED};

/// Snapshot handed to observers. Replaced wholesale on every publish.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionState {
    pub is_monitoring: bool,
    pub subway_detected: bool,
    /// Always within [0, 1].
    pub confidence: f32,
    pub reason: String,
    pub last_known_location: Option<Location>,
}

impl DetectionState {
    /// Monitoring began; detection fields carry over from `prev`.
    pub fn started(prev: &DetectionState) -> Self {
        Self {
            is_monitoring: true,
            reason: REASON_STARTED.to_string(),
            ..prev.clone()
        }
    }

    /// Monitoring ended. Only the last known location survives.
    pub fn stopped(prev: &DetectionState) -> Self {
        Self {
            is_monitoring: false,
            subway_detected: false,
            confidence: 0.0,
            reason: REASON_STOPPED.to_string(),
            last_known_location: prev.last_known_location,
        }
    }

    /// Result of one tick. A fresh fix replaces the stored location.
    pub fn ticked(prev: &DetectionState, fused: Fused, fix: Option<Location>) -> Self {
        Self {
            is_monitoring: true,
            subway_detected: fused.detected,
            confidence: fused.confidence,
            reason: fused.reason,
            last_known_location: fix.or(prev.last_known_location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_resets_detection_but_keeps_location() {
        let prev = DetectionState {
            is_monitoring: true,
            subway_detected: true,
            confidence: 0.9,
            reason: "detected: weak positioning".into(),
            last_known_location: Some(Location::new(37.5, 127.0)),
        };
        let s = DetectionState::stopped(&prev);
        assert!(!s.is_monitoring);
        assert!(!s.subway_detected);
        assert_eq!(s.confidence, 0.0);
        assert_eq!(s.reason, "monitoring stopped");
        assert_eq!(s.last_known_location, prev.last_known_location);
    }

    #[test]
    fn tick_without_fix_keeps_previous_location() {
        let prev = DetectionState {
            last_known_location: Some(Location::new(1.0, 2.0)),
            ..DetectionState::default()
        };
        let fused = Fused {
            confidence: 0.3,
            detected: false,
            reason: "normal state".into(),
        };
        let s = DetectionState::ticked(&prev, fused.clone(), None);
        assert_eq!(s.last_known_location, Some(Location::new(1.0, 2.0)));
        let s = DetectionState::ticked(&prev, fused, Some(Location::new(3.0, 4.0)));
        assert_eq!(s.last_known_location, Some(Location::new(3.0, 4.0)));
    }
}
