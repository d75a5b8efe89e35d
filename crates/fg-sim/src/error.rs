use fg_core::FgError;
use fg_fleet::FleetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] FgError),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("malformed command: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("fleet error: {0}")]
    Fleet(#[from] FleetError),
}

pub type SimResult<T> = Result<T, SimError>;
