//! Worker pool
//!
//! A fixed number of independent loops, each repeatedly leasing a task,
//! fetching its input, applying the transform, storing the output and
//! reporting completion. Any failure abandons the attempt and the loop starts
//! over after a fixed backoff; an abandoned lease heals when its timer fires.

mod pool;
pub mod runner;
pub mod transform;

pub use pool::WorkerPool;
pub use runner::{WorkerError, run_cycle};
pub use transform::{Transform, TransformError, default_transform, swap_red_green};
