//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `FgError` as one variant
//! where they surface configuration or I/O failures.

use thiserror::Error;

/// The top-level error type for `fg-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum FgError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `fg-*` crates.
pub type FgResult<T> = Result<T, FgError>;
