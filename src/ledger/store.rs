use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::observability::Metrics;

use super::error::{LedgerError, Result};
use super::lease::{Lease, schedule_reclaim};
use super::task::{Task, TaskId, TaskState};

/// Task sequence plus the scan cursor, always locked together
#[derive(Debug, Default)]
struct LedgerState {
    tasks: Vec<Task>,
    /// Every id below the cursor is completed
    cursor: usize,
}

impl LedgerState {
    fn get(&self, id: TaskId) -> Option<&Task> {
        id.index().and_then(|index| self.tasks.get(index))
    }

    fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        id.index().and_then(|index| self.tasks.get_mut(index))
    }
}

/// Counts per state, for observability only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total: usize,
    pub pending: usize,
    pub leased: usize,
    pub completed: usize,
    pub scan_cursor: usize,
}

/// In-memory authority over every task and its lease
///
/// Reads (`get_task`, `list`, `stats`) share the lock. Every mutation takes it
/// exclusively, and `assign_next` holds it across the whole scan so two callers
/// can never lease the same pending task.
#[derive(Clone)]
pub struct TaskLedger {
    state: Arc<RwLock<LedgerState>>,
    lease_duration: Duration,
    metrics: Arc<Metrics>,
}

impl TaskLedger {
    pub fn new(lease_duration: Duration) -> Self {
        Self::with_metrics(lease_duration, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(lease_duration: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::default())),
            lease_duration,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Append a pending task; its id is the previous task count
    pub async fn create_task(&self) -> TaskId {
        let id = {
            let mut state = self.state.write().await;
            let id = TaskId(state.tasks.len() as u64);
            state.tasks.push(Task::pending(id));
            id
        };

        self.metrics.task_created();
        debug!(task_id = %id, "Task created");
        id
    }

    pub async fn get_task(&self, id: TaskId) -> Result<Task> {
        let state = self.state.read().await;
        state.get(id).cloned().ok_or(LedgerError::NotFound(id))
    }

    /// Lease the lowest pending task at or above the scan cursor
    ///
    /// Completed tasks sitting exactly at the cursor advance it. Leased tasks and
    /// completed tasks past the cursor are skipped. The scan always restarts at
    /// the cursor.
    pub async fn assign_next(&self) -> Result<Task> {
        let leased = {
            let mut guard = self.state.write().await;
            let LedgerState { tasks, cursor } = &mut *guard;

            let mut leased = None;
            for index in *cursor..tasks.len() {
                let task = &mut tasks[index];
                match task.state {
                    TaskState::Completed if index == *cursor => *cursor += 1,
                    TaskState::Pending => {
                        task.state = TaskState::Leased;
                        task.attempts += 1;
                        task.leased_at = Some(Utc::now());
                        leased = Some((task.clone(), Lease::starting_now(task.id, task.attempts, self.lease_duration)));
                        break;
                    }
                    _ => {}
                }
            }
            leased
        };

        let (task, lease) = leased.ok_or(LedgerError::NoWorkAvailable)?;

        schedule_reclaim(self.clone(), lease);
        self.metrics.lease_issued();
        info!(task_id = %task.id, attempt = task.attempts, "Lease issued");

        Ok(task)
    }

    /// Mark a leased task completed. Any other state is rejected untouched.
    pub async fn complete(&self, id: TaskId) -> Result<Task> {
        let mut state = self.state.write().await;
        let task = state.get_mut(id).ok_or(LedgerError::NotFound(id))?;

        if task.state != TaskState::Leased {
            self.metrics.completion_rejected();
            warn!(task_id = %id, state = %task.state, "Completion rejected");
            return Err(LedgerError::InvalidStateTransition(id));
        }

        task.state = TaskState::Completed;
        let completed = task.clone();
        drop(state);

        self.metrics.completion_accepted();
        info!(task_id = %id, "Task completed");
        Ok(completed)
    }

    /// Return a lease to pending if it is still the live lease for `epoch`
    pub(crate) async fn reclaim(&self, id: TaskId, epoch: u32) -> bool {
        let mut state = self.state.write().await;
        let Some(task) = state.get_mut(id) else {
            return false;
        };

        if task.state == TaskState::Leased && task.attempts == epoch {
            task.state = TaskState::Pending;
            drop(state);

            self.metrics.lease_reclaimed();
            info!(task_id = %id, epoch, "Lease expired, task returned to pending");
            true
        } else {
            debug!(task_id = %id, epoch, state = %task.state, "Stale lease timer ignored");
            false
        }
    }

    pub async fn list(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    pub async fn stats(&self) -> LedgerStats {
        let state = self.state.read().await;
        let mut stats = LedgerStats {
            total: state.tasks.len(),
            scan_cursor: state.cursor,
            ..LedgerStats::default()
        };

        for task in &state.tasks {
            match task.state {
                TaskState::Pending => stats.pending += 1,
                TaskState::Leased => stats.leased += 1,
                TaskState::Completed => stats.completed += 1,
            }
        }
        stats
    }

    pub async fn scan_cursor(&self) -> usize {
        self.state.read().await.cursor
    }
}
