//! Per-operation progress reporting
//!
//! Only the worker driving an operation owns its tracker, so updates for one
//! operation are applied in order.

use crate::core::state::OperationRegistry;
use crate::domain::ids::OperationId;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Caller-supplied progress callback, receives values in `[0.0, 1.0]`
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Counts processed files of one operation and publishes progress
pub struct ProgressTracker {
    registry: Arc<OperationRegistry>,
    operation_id: OperationId,
    total: usize,
    processed: usize,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    pub fn new(
        registry: Arc<OperationRegistry>,
        operation_id: OperationId,
        total: usize,
        callback: Option<ProgressCallback>,
    ) -> Self {
        Self {
            registry,
            operation_id,
            total,
            processed: 0,
            callback,
        }
    }

    /// Records one more file written into the artifact
    pub fn file_processed(&mut self) {
        self.processed = (self.processed + 1).min(self.total);
        self.publish();
    }

    /// Records a file left out of the artifact
    ///
    /// Progress does not advance, but the callback still fires so callers
    /// hear about every file.
    pub fn file_skipped(&mut self) {
        self.publish();
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    fn publish(&self) {
        let Some(progress) =
            self.registry
                .update_progress(&self.operation_id, self.processed, self.total)
        else {
            return;
        };

        if let Some(callback) = &self.callback {
            if catch_unwind(AssertUnwindSafe(|| callback(progress))).is_err() {
                tracing::warn!(
                    operation_id = %self.operation_id,
                    "Progress callback panicked"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::FileId;
    use crate::domain::operation::ExportKind;
    use crate::domain::options::ExportOptions;
    use std::sync::Mutex;
    use std::time::Duration;

    fn setup(files: usize) -> (Arc<OperationRegistry>, OperationId) {
        let registry = Arc::new(OperationRegistry::new(10, Duration::from_secs(60)));
        let ids = (0..files).map(|i| FileId::new(format!("f{i}")).unwrap()).collect();
        let id = registry.create(ExportKind::BatchFiles, ids, ExportOptions::default());
        (registry, id)
    }

    #[test]
    fn test_callback_receives_non_decreasing_values() {
        let (registry, id) = setup(4);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));

        let mut tracker = ProgressTracker::new(registry.clone(), id.clone(), 4, Some(callback));
        tracker.file_processed();
        tracker.file_skipped();
        tracker.file_processed();
        tracker.file_processed();

        let values = seen.lock().unwrap().clone();
        assert_eq!(values, vec![0.25, 0.25, 0.5, 0.75]);
        assert_eq!(registry.get(&id).unwrap().processed_files, 3);
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let (registry, id) = setup(1);
        let callback: ProgressCallback = Arc::new(|_| panic!("callback bug"));

        let mut tracker = ProgressTracker::new(registry.clone(), id.clone(), 1, Some(callback));
        tracker.file_processed();

        assert_eq!(registry.get(&id).unwrap().progress, 1.0);
    }
}
