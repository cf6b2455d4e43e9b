use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectionError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("provider timed out after {0} ms")]
    ProviderTimeout(u64),
    #[error("non-finite {0} sample in analysis window")]
    NonFiniteSample(&'static str),
    #[error("non-finite {0} score")]
    NonFiniteScore(&'static str),
    #[error("tick panicked: {0}")]
    TickPanicked(String),
    #[error("controller has been cleaned up")]
    Terminated,
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing motion source")]
    MissingMotionSource,
    #[error("missing position provider")]
    MissingPositionProvider,
    #[error("missing network snapshot provider")]
    MissingNetworkProvider,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
