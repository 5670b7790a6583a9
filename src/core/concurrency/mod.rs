//! Concurrency control: the heavy-export semaphore and per-operation progress

pub mod limiter;
pub mod progress;

pub use limiter::{ConcurrencyController, ExportPermit};
pub use progress::{ProgressCallback, ProgressTracker};
