use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::coordinator::WorkSource;
use crate::observability::Metrics;
use crate::storage::BlobStore;

use super::runner::run_cycle;
use super::transform::Transform;

/// Everything one slot needs, shared by all slots of a pool
struct Worker {
    pool_id: Uuid,
    source: Arc<dyn WorkSource>,
    blobs: Arc<dyn BlobStore>,
    transform: Transform,
    backoff: Duration,
    metrics: Arc<Metrics>,
}

impl Worker {
    async fn run(&self, slot: usize) -> Infallible {
        loop {
            match run_cycle(self.source.as_ref(), self.blobs.as_ref(), &self.transform).await {
                Ok(id) => {
                    self.metrics.cycle_succeeded();
                    info!(pool = %self.pool_id, worker = slot, task_id = %id, "Task processed");
                    continue;
                }
                Err(err) if err.is_idle() => {
                    debug!(pool = %self.pool_id, worker = slot, "No work available");
                }
                Err(err) => {
                    self.metrics.cycle_failed();
                    warn!(pool = %self.pool_id, worker = slot, error = %err, "Cycle failed, backing off");
                }
            }
            tokio::time::sleep(self.backoff).await;
        }
    }
}

/// Fixed set of independent worker loops
///
/// Each slot runs under a supervisor that restarts its loop after a panic.
/// Loops never stop on their own.
pub struct WorkerPool {
    id: Uuid,
    slots: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        config: &WorkerConfig,
        source: Arc<dyn WorkSource>,
        blobs: Arc<dyn BlobStore>,
        transform: Transform,
    ) -> Self {
        Self::spawn_with_metrics(config, source, blobs, transform, Arc::new(Metrics::new()))
    }

    pub fn spawn_with_metrics(
        config: &WorkerConfig,
        source: Arc<dyn WorkSource>,
        blobs: Arc<dyn BlobStore>,
        transform: Transform,
        metrics: Arc<Metrics>,
    ) -> Self {
        let id = Uuid::new_v4();
        let worker = Arc::new(Worker {
            pool_id: id,
            source,
            blobs,
            transform,
            backoff: config.backoff.as_duration(),
            metrics,
        });

        let slots = (0..config.count)
            .map(|slot| tokio::spawn(supervise(Arc::clone(&worker), slot)))
            .collect();

        info!(pool = %id, workers = config.count, backoff = %config.backoff, "Worker pool started");
        Self { id, slots }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait on every slot. Only returns once the runtime shuts the slots down.
    pub async fn join(self) {
        for slot in self.slots {
            let _ = slot.await;
        }
    }
}

async fn supervise(worker: Arc<Worker>, slot: usize) {
    loop {
        let running = Arc::clone(&worker);
        match tokio::spawn(async move { running.run(slot).await }).await {
            Ok(never) => match never {},
            Err(err) if err.is_panic() => {
                error!(pool = %worker.pool_id, worker = slot, "Worker loop panicked, restarting");
                tokio::time::sleep(worker.backoff).await;
            }
            Err(_) => {
                debug!(pool = %worker.pool_id, worker = slot, "Worker loop cancelled");
                return;
            }
        }
    }
}
