//! Coordinator: stateless facade over the ledger and the blob store
//!
//! Clients see [`SubmissionApi`], workers see [`WorkSource`]. Both are served
//! by the in-process [`Coordinator`] and by the HTTP `CoordinatorClient`.

use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;
use thiserror::Error;

use crate::ledger::{LedgerError, Task, TaskId};
use crate::storage::StorageError;

mod service;

pub use service::Coordinator;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The remote coordinator refused the upload's size
    #[error("{0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Ledger(LedgerError),

    #[error(transparent)]
    Storage(StorageError),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl CoordinatorError {
    /// True when the ledger had nothing to lease
    pub fn is_no_work(&self) -> bool {
        matches!(self, CoordinatorError::Ledger(LedgerError::NoWorkAvailable))
    }
}

impl From<LedgerError> for CoordinatorError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unavailable(reason) => CoordinatorError::UpstreamUnavailable(reason),
            other => CoordinatorError::Ledger(other),
        }
    }
}

impl From<StorageError> for CoordinatorError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } | StorageError::InvalidStage(_) => {
                CoordinatorError::Storage(err)
            }
            other => CoordinatorError::UpstreamUnavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Client-facing operations
#[async_trait]
pub trait SubmissionApi: Send + Sync {
    /// Create a task for `data` and store it as the task's working blob
    async fn submit(&self, data: Bytes) -> Result<TaskId>;

    async fn is_ready(&self, id: TaskId) -> Result<bool>;

    /// The finished blob; `NotFound` until a worker stored it
    async fn fetch(&self, id: TaskId) -> Result<Bytes>;
}

/// Worker-facing operations
#[async_trait]
pub trait WorkSource: Send + Sync {
    async fn lease_next(&self) -> Result<Task>;

    async fn report_finished(&self, id: TaskId) -> Result<()>;
}

/// Reject uploads that can never be processed: empty bodies and non-PNG data
pub fn validate_upload(data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Err(CoordinatorError::InvalidInput("upload is empty".into()));
    }

    match image::guess_format(data) {
        Ok(ImageFormat::Png) => Ok(()),
        _ => Err(CoordinatorError::InvalidInput(
            "upload is not a PNG image".into(),
        )),
    }
}
