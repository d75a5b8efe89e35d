//! Spatial-subsystem error type.

use thiserror::Error;

use fg_core::Position;

/// Errors produced by `fg-spatial`.
///
/// The fleet collapses all three into "no path", but the distinction is kept
/// here for callers that want to tell a blocked endpoint from a walled-off one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpatialError {
    #[error("{0} is outside the grid")]
    OutOfBounds(Position),

    #[error("endpoint {0} is an obstacle")]
    BlockedEndpoint(Position),

    #[error("no route from {from} to {to}")]
    NoRoute { from: Position, to: Position },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
