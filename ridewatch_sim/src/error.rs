use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("positioning request timed out")]
    Timeout,
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
