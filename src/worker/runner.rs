//! One worker cycle: lease, fetch, transform, store, report

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::coordinator::{CoordinatorError, WorkSource};
use crate::ledger::TaskId;
use crate::storage::{BlobStore, Stage, StorageError};

use super::transform::{self, Transform, TransformError};

/// Where a cycle stopped. Every variant is retried from the top after one backoff.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("lease failed: {0}")]
    Lease(#[source] CoordinatorError),

    #[error("fetching input for task {id} failed: {source}")]
    FetchInput { id: TaskId, source: StorageError },

    #[error("transforming task {id} failed: {source}")]
    Transform { id: TaskId, source: TransformError },

    #[error("storing output for task {id} failed: {source}")]
    StoreOutput { id: TaskId, source: StorageError },

    #[error("reporting task {id} finished failed: {source}")]
    Report { id: TaskId, source: CoordinatorError },
}

impl WorkerError {
    /// An empty ledger, as opposed to a failure
    pub fn is_idle(&self) -> bool {
        matches!(self, WorkerError::Lease(err) if err.is_no_work())
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;

/// Process at most one task. Nothing is carried over between cycles.
pub async fn run_cycle(
    source: &dyn WorkSource,
    blobs: &dyn BlobStore,
    transform: &Transform,
) -> Result<TaskId> {
    let task = source.lease_next().await.map_err(WorkerError::Lease)?;
    let id = task.id;
    debug!(task_id = %id, attempt = task.attempts, "Lease acquired");

    let input = blobs
        .get(id, Stage::Working)
        .await
        .map_err(|source| WorkerError::FetchInput { id, source })?;

    let output = transform::apply(transform, input)
        .await
        .map_err(|source| WorkerError::Transform { id, source })?;

    blobs
        .put(id, Stage::Finished, Bytes::from(output))
        .await
        .map_err(|source| WorkerError::StoreOutput { id, source })?;

    report(source, id).await?;
    Ok(id)
}

async fn report(source: &dyn WorkSource, id: TaskId) -> Result<()> {
    source
        .report_finished(id)
        .await
        .map_err(|source| WorkerError::Report { id, source })
}
