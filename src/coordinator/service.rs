use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::ledger::{LedgerApi, Task, TaskId};
use crate::observability::Metrics;
use crate::storage::{BlobStore, Stage};

use super::{CoordinatorError, Result, SubmissionApi, WorkSource, validate_upload};

/// Routes client and worker calls onto the ledger and the blob store
///
/// Holds no state of its own. The ledger and the store may each be local or
/// remote.
#[derive(Clone)]
pub struct Coordinator {
    ledger: Arc<dyn LedgerApi>,
    blobs: Arc<dyn BlobStore>,
    metrics: Arc<Metrics>,
}

impl Coordinator {
    pub fn new(ledger: Arc<dyn LedgerApi>, blobs: Arc<dyn BlobStore>, metrics: Arc<Metrics>) -> Self {
        Self {
            ledger,
            blobs,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Ledger snapshot, for observability
    pub async fn list(&self) -> Result<Vec<Task>> {
        Ok(self.ledger.list().await?)
    }
}

#[async_trait]
impl SubmissionApi for Coordinator {
    async fn submit(&self, data: Bytes) -> Result<TaskId> {
        validate_upload(&data)?;

        let id = self.ledger.create_task().await?;

        // The task already exists; a failed write leaves it pending with no input
        if let Err(err) = self.blobs.put(id, Stage::Working, data).await {
            self.metrics.submission_orphaned();
            warn!(task_id = %id, error = %err, "Input blob write failed, task orphaned");
            return Err(CoordinatorError::UpstreamUnavailable(format!(
                "failed to store input for task {id}: {err}"
            )));
        }

        self.metrics.submission_accepted();
        info!(task_id = %id, "Submission accepted");
        Ok(id)
    }

    async fn is_ready(&self, id: TaskId) -> Result<bool> {
        Ok(self.ledger.get_task(id).await?.is_completed())
    }

    async fn fetch(&self, id: TaskId) -> Result<Bytes> {
        Ok(self.blobs.get(id, Stage::Finished).await?)
    }
}

#[async_trait]
impl WorkSource for Coordinator {
    async fn lease_next(&self) -> Result<Task> {
        Ok(self.ledger.assign_next().await?)
    }

    async fn report_finished(&self, id: TaskId) -> Result<()> {
        self.ledger.complete(id).await?;
        debug!(task_id = %id, "Finish report accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerError, TaskLedger, TaskState};
    use crate::storage::{ObjectBlobStore, StorageError};
    use std::time::Duration;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn coordinator() -> (Coordinator, TaskLedger, ObjectBlobStore) {
        let metrics = Arc::new(Metrics::new());
        let ledger = TaskLedger::with_metrics(Duration::from_secs(120), metrics.clone());
        let blobs = ObjectBlobStore::in_memory();
        let coordinator = Coordinator::new(Arc::new(ledger.clone()), Arc::new(blobs.clone()), metrics);
        (coordinator, ledger, blobs)
    }

    /// Accepts nothing
    struct BrokenStore;

    #[async_trait]
    impl BlobStore for BrokenStore {
        async fn put(&self, _id: TaskId, _stage: Stage, _data: Bytes) -> crate::storage::Result<()> {
            Err(StorageError::Unavailable("connection refused".into()))
        }

        async fn get(&self, id: TaskId, stage: Stage) -> crate::storage::Result<Bytes> {
            Err(StorageError::NotFound { id, stage })
        }
    }

    #[tokio::test]
    async fn test_submit_creates_task_and_stores_input() {
        let (coordinator, ledger, blobs) = coordinator();

        let id = coordinator.submit(Bytes::from_static(PNG)).await.unwrap();

        assert_eq!(id, TaskId(0));
        assert_eq!(ledger.get_task(id).await.unwrap().state, TaskState::Pending);
        assert_eq!(blobs.get(id, Stage::Working).await.unwrap(), Bytes::from_static(PNG));
        assert_eq!(coordinator.metrics().snapshot().submissions_accepted, 1);
    }

    #[tokio::test]
    async fn test_submit_rejects_before_creating_task() {
        let (coordinator, ledger, _) = coordinator();

        let err = coordinator.submit(Bytes::from_static(b"not an image")).await.unwrap_err();

        assert!(matches!(err, CoordinatorError::InvalidInput(_)));
        assert!(ledger.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_blob_write_orphans_task() {
        let metrics = Arc::new(Metrics::new());
        let ledger = TaskLedger::with_metrics(Duration::from_secs(120), metrics.clone());
        let coordinator = Coordinator::new(Arc::new(ledger.clone()), Arc::new(BrokenStore), metrics.clone());

        let err = coordinator.submit(Bytes::from_static(PNG)).await.unwrap_err();

        assert!(matches!(err, CoordinatorError::UpstreamUnavailable(_)));
        // The ledger still holds the task
        assert_eq!(ledger.get_task(TaskId(0)).await.unwrap().state, TaskState::Pending);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.submissions_orphaned, 1);
        assert_eq!(snapshot.submissions_accepted, 0);
    }

    #[tokio::test]
    async fn test_ready_follows_completion() {
        let (coordinator, _, _) = coordinator();
        let id = coordinator.submit(Bytes::from_static(PNG)).await.unwrap();

        assert!(!coordinator.is_ready(id).await.unwrap());

        let task = coordinator.lease_next().await.unwrap();
        assert_eq!(task.id, id);
        assert!(!coordinator.is_ready(id).await.unwrap());

        coordinator.report_finished(id).await.unwrap();
        assert!(coordinator.is_ready(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (coordinator, _, _) = coordinator();

        assert!(matches!(
            coordinator.is_ready(TaskId(9)).await,
            Err(CoordinatorError::Ledger(LedgerError::NotFound(TaskId(9))))
        ));
        assert!(matches!(
            coordinator.fetch(TaskId(9)).await,
            Err(CoordinatorError::Storage(StorageError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_fetch_before_finish_is_not_found() {
        let (coordinator, _, blobs) = coordinator();
        let id = coordinator.submit(Bytes::from_static(PNG)).await.unwrap();

        assert!(coordinator.fetch(id).await.is_err());

        blobs.put(id, Stage::Finished, Bytes::from_static(b"out")).await.unwrap();
        assert_eq!(coordinator.fetch(id).await.unwrap(), Bytes::from_static(b"out"));
    }

    #[tokio::test]
    async fn test_lease_and_report_pass_through() {
        let (coordinator, _, _) = coordinator();

        assert!(coordinator.lease_next().await.unwrap_err().is_no_work());

        let id = coordinator.submit(Bytes::from_static(PNG)).await.unwrap();
        assert!(matches!(
            coordinator.report_finished(id).await,
            Err(CoordinatorError::Ledger(LedgerError::InvalidStateTransition(_)))
        ));
    }
}
