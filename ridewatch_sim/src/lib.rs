//! Simulated collaborators for the ride detection engine.
//!
//! Stand-ins for the platform's motion sensors, positioning subsystem and
//! Wi-Fi scanner, driven by canned scenarios or recorded traces. Used by the
//! CLI and by integration tests.
pub mod error;
pub mod motion;
pub mod network;
pub mod position;
pub mod scenario;

pub use error::SimError;
pub use motion::{ReplayMotionSource, ScenarioMotionSource};
pub use network::{NetworkStep, ScriptedNetworkProvider};
pub use position::{PositionStep, ScriptedPositionProvider};
pub use scenario::{Scenario, XorShift32};
