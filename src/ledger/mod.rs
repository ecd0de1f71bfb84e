//! Task ledger: the single authority over task state and leases
//!
//! Tasks live in an in-memory, append-only sequence indexed by their id.
//! A task moves `pending -> leased -> completed`, and back to `pending` when
//! its lease expires before completion. Completed tasks never change again.
//!
//! ## Lease assignment
//!
//! [`TaskLedger::assign_next`] scans upward from a scan cursor for the first
//! pending task. The cursor skips the contiguous completed prefix, so repeated
//! scans do not re-walk finished work. Each lease starts a detached timer that
//! returns the task to pending after the lease duration unless it was completed
//! first (see [`lease`]).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pixelq::ledger::TaskLedger;
//!
//! let ledger = TaskLedger::new(Duration::from_secs(120));
//! let id = ledger.create_task().await;
//! let task = ledger.assign_next().await?;
//! ledger.complete(task.id).await?;
//! ```

use async_trait::async_trait;

pub mod error;
pub(crate) mod lease;
pub mod store;
pub mod task;

pub use error::{LedgerError, Result};
pub use store::{LedgerStats, TaskLedger};
pub use task::{Task, TaskId, TaskState};

/// Ledger operations the coordinator depends on, local or remote
#[async_trait]
pub trait LedgerApi: Send + Sync {
    async fn create_task(&self) -> Result<TaskId>;

    async fn get_task(&self, id: TaskId) -> Result<Task>;

    async fn assign_next(&self) -> Result<Task>;

    async fn complete(&self, id: TaskId) -> Result<Task>;

    async fn list(&self) -> Result<Vec<Task>>;
}

#[async_trait]
impl LedgerApi for TaskLedger {
    async fn create_task(&self) -> Result<TaskId> {
        Ok(TaskLedger::create_task(self).await)
    }

    async fn get_task(&self, id: TaskId) -> Result<Task> {
        TaskLedger::get_task(self, id).await
    }

    async fn assign_next(&self) -> Result<Task> {
        TaskLedger::assign_next(self).await
    }

    async fn complete(&self, id: TaskId) -> Result<Task> {
        TaskLedger::complete(self, id).await
    }

    async fn list(&self) -> Result<Vec<Task>> {
        Ok(TaskLedger::list(self).await)
    }
}
