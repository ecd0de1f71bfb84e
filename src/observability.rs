//! Tracing setup and process-local counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "pixelq=info,tower_http=info";

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A second init (tests, embedded use) is harmless
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    tasks_created: AtomicU64,
    leases_issued: AtomicU64,
    leases_reclaimed: AtomicU64,
    completions_accepted: AtomicU64,
    completions_rejected: AtomicU64,
    submissions_accepted: AtomicU64,
    submissions_orphaned: AtomicU64,
    cycles_succeeded: AtomicU64,
    cycles_failed: AtomicU64,
}

macro_rules! counter {
    ($method:ident, $field:ident) => {
        pub fn $method(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(counter = stringify!($field), "Metric incremented");
        }
    };
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    counter!(task_created, tasks_created);
    counter!(lease_issued, leases_issued);
    counter!(lease_reclaimed, leases_reclaimed);
    counter!(completion_accepted, completions_accepted);
    counter!(completion_rejected, completions_rejected);
    counter!(submission_accepted, submissions_accepted);
    counter!(submission_orphaned, submissions_orphaned);
    counter!(cycle_succeeded, cycles_succeeded);
    counter!(cycle_failed, cycles_failed);

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tasks_created: self.tasks_created.load(Ordering::Relaxed),
            leases_issued: self.leases_issued.load(Ordering::Relaxed),
            leases_reclaimed: self.leases_reclaimed.load(Ordering::Relaxed),
            completions_accepted: self.completions_accepted.load(Ordering::Relaxed),
            completions_rejected: self.completions_rejected.load(Ordering::Relaxed),
            submissions_accepted: self.submissions_accepted.load(Ordering::Relaxed),
            submissions_orphaned: self.submissions_orphaned.load(Ordering::Relaxed),
            cycles_succeeded: self.cycles_succeeded.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub tasks_created: u64,
    pub leases_issued: u64,
    pub leases_reclaimed: u64,
    pub completions_accepted: u64,
    pub completions_rejected: u64,
    pub submissions_accepted: u64,
    pub submissions_orphaned: u64,
    pub cycles_succeeded: u64,
    pub cycles_failed: u64,
}
