//! Lease reclamation timers
//!
//! Every lease gets one detached timer. Timers are never cancelled: when one
//! fires for a task that was completed, or that has since been leased again
//! under a newer epoch, the reclaim is a no-op.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::store::TaskLedger;
use super::task::TaskId;

/// A lease as seen by its timer
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lease {
    pub id: TaskId,
    pub epoch: u32,
    pub deadline: Instant,
}

impl Lease {
    pub fn starting_now(id: TaskId, epoch: u32, duration: Duration) -> Self {
        Self {
            id,
            epoch,
            deadline: Instant::now() + duration,
        }
    }
}

/// Spawn the reclaim timer for `lease`. Resolves to whether the task was returned to pending.
pub(crate) fn schedule_reclaim(ledger: TaskLedger, lease: Lease) -> JoinHandle<bool> {
    tokio::spawn(async move {
        tokio::time::sleep_until(lease.deadline).await;
        ledger.reclaim(lease.id, lease.epoch).await
    })
}
