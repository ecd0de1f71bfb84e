use thiserror::Error;

use super::task::TaskId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("task {0} is not leased")]
    InvalidStateTransition(TaskId),

    #[error("no pending task available")]
    NoWorkAvailable,

    /// Only produced by remote ledgers
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
