#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::missing_panics_doc
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Subway ride detection engine (platform-agnostic).
//!
//! All platform interactions go through the collaborator traits in
//! `ridewatch_traits`: motion events, positioning fixes and wireless network
//! snapshots. Every tick three independent detectors are fused into one
//! confidence value and published to observers.
//!
//! ## Architecture
//!
//! - **Buffers**: bounded FIFO windows fed from the motion source (`buffer`, `sampler`)
//! - **Detectors**: motion pattern (`analyzer`), positioning loss (`signal_loss`),
//!   network churn (`network`)
//! - **Fusion**: weighted, clamped confidence plus a reason (`fusion`)
//! - **Lifecycle**: Idle / Monitoring / Terminated with a single tick worker (`controller`)
//! - **Publication**: observer registry with whole-state replacement (`publisher`)

pub mod analyzer;
pub mod buffer;
pub mod builder;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod fusion;
pub mod mocks;
pub mod network;
pub mod provider_error;
pub mod publisher;
pub mod sampler;
pub mod signal_loss;
pub mod state;
pub mod util;

pub use analyzer::{MotionPatternAnalyzer, MotionScores};
pub use buffer::{MotionSample, SampleBuffer};
pub use builder::{DetectionControllerBuilder, Missing, Set};
pub use config::{DetectionConfig, FusionWeights};
pub use controller::DetectionController;
pub use engine::{DetectionEngine, TickOutcome, TickScores};
pub use error::{BuildError, DetectionError, Report, Result};
pub use fusion::{ConfidenceFusionEngine, Fused};
pub use network::{NetworkChurnDetector, WifiSnapshot};
pub use publisher::{StatePublisher, Subscription, SubscriptionId};
pub use sampler::MotionBuffers;
pub use signal_loss::{PositionOutcome, PositionReading, SignalLossDetector};
pub use state::DetectionState;

pub use ridewatch_traits::{Location, MotionKind};
