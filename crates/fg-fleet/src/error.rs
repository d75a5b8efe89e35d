use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FleetError {
    #[error("fleet worker has shut down")]
    QueueClosed,

    #[error("fleet operation `{0}` failed before producing a result")]
    OperationFailed(&'static str),
}

pub type FleetResult<T> = Result<T, FleetError>;
