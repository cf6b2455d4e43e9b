//! Canned ride scenarios and the motion signal each one produces.

use std::f32::consts::TAU;
use std::str::FromStr;

use ridewatch_traits::MotionKind;

use crate::error::SimError;

/// Standard gravity (m/s²).
pub const GRAVITY: f32 = 9.81;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Phone on a desk: gravity only, good positioning, stable Wi-Fi.
    Stationary,
    /// Pedestrian gait: large periodic acceleration swings, moving Wi-Fi.
    Walking,
    /// Underground carriage: strong steady vibration, curve rotation bursts,
    /// positioning and Wi-Fi lost after boarding.
    Subway,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Stationary, Scenario::Walking, Scenario::Subway];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Stationary => "stationary",
            Scenario::Walking => "walking",
            Scenario::Subway => "subway",
        }
    }

    /// Motion reading number `step` for `kind`, with noise drawn from `rng`.
    pub fn motion(self, kind: MotionKind, step: u64, rng: &mut XorShift32) -> (f32, f32, f32) {
        let n = |rng: &mut XorShift32, amp: f32| rng.symmetric() * amp;
        match (self, kind) {
            (Scenario::Stationary, MotionKind::Accel) => {
                (n(rng, 0.05), n(rng, 0.05), GRAVITY + n(rng, 0.05))
            }
            (Scenario::Stationary, MotionKind::Gyro) => (n(rng, 0.02), n(rng, 0.02), n(rng, 0.02)),
            (Scenario::Walking, MotionKind::Accel) => {
                // ~2 steps per second at 50 Hz
                let phase = TAU * (step % 25) as f32 / 25.0;
                (
                    n(rng, 0.4),
                    1.5 * phase.cos() + n(rng, 0.4),
                    GRAVITY + 4.2 * phase.sin() + n(rng, 0.4),
                )
            }
            (Scenario::Walking, MotionKind::Gyro) => {
                let phase = TAU * (step % 25) as f32 / 25.0;
                (0.9 * phase.sin().abs() + n(rng, 0.1), n(rng, 0.1), n(rng, 0.1))
            }
            (Scenario::Subway, MotionKind::Accel) => {
                (n(rng, 0.5), n(rng, 0.5), 11.6 + n(rng, 0.5))
            }
            (Scenario::Subway, MotionKind::Gyro) => {
                // a curve or a jolt every fifth reading
                let base = if step % 5 == 0 { 1.8 } else { 0.45 };
                (base + n(rng, 0.08), n(rng, 0.05), n(rng, 0.05))
            }
        }
    }
}

impl FromStr for Scenario {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stationary" => Ok(Scenario::Stationary),
            "walking" => Ok(Scenario::Walking),
            "subway" => Ok(Scenario::Subway),
            other => Err(SimError::Unavailable(format!("unknown scenario '{other}'"))),
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tiny deterministic PRNG (xorshift32).
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in [0, 1).
    pub fn unit(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform in [-1, 1).
    pub fn symmetric(&mut self) -> f32 {
        self.unit() * 2.0 - 1.0
    }
}
