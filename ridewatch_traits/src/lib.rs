//! Collaborator boundaries for the ride detection engine.
//!
//! Motion sensors, the positioning subsystem and the wireless-network scanner
//! are all external; the engine only talks to them through these traits.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Error type carried across collaborator boundaries.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Which motion sensor produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionKind {
    /// Linear acceleration including gravity (m/s²).
    Accel,
    /// Angular rate (rad/s).
    Gyro,
}

/// A positioning fix as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &Location) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// Receiver of motion events. Implementations must be cheap and non-blocking:
/// `deliver` is called from the sensor's own delivery context.
pub trait MotionSink: Send + Sync {
    fn deliver(&self, kind: MotionKind, x: f32, y: f32, z: f32);
}

/// Source of accelerometer and gyroscope events.
///
/// `register` and `unregister` are synchronous and idempotent: registering
/// again replaces the previous sink, unregistering twice is harmless. After
/// `unregister` returns the sink receives no further events.
pub trait MotionSource {
    fn register(&mut self, sink: Arc<dyn MotionSink>) -> Result<(), ProviderError>;
    fn unregister(&mut self);
}

/// Positioning subsystem. May be slow or fail; has no guaranteed cached value.
pub trait PositionProvider {
    /// Return the current fix, `Ok(None)` when no fix is available.
    /// Implementations should give up once `timeout` has elapsed.
    fn current_fix(&mut self, timeout: Duration) -> Result<Option<Location>, ProviderError>;
}

/// Best-effort scanner for visible wireless network identifiers.
pub trait NetworkSnapshotProvider {
    fn current_identifiers(&mut self) -> Result<BTreeSet<String>, ProviderError>;
}
