//! Operation registry
//!
//! The authoritative in-memory table of export operations. Records are keyed
//! by [`OperationId`] in a [`DashMap`], so every mutation holds the lock of one
//! record only; no operation spans two records.

use crate::domain::errors::{CourierError, ExportError};
use crate::domain::ids::{FileId, OperationId};
use crate::domain::operation::{ExportKind, ExportOperation, ExportStatus};
use crate::domain::options::ExportOptions;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::path::PathBuf;

/// Details written onto an operation when it completes
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub output_path: PathBuf,
    pub metadata: Vec<(String, serde_json::Value)>,
}

/// Download handle minted for a completed operation
#[derive(Debug, Clone)]
pub struct IssuedDownload {
    pub token: String,
    pub expiry_time: DateTime<Utc>,
}

/// In-memory table of all export operations
pub struct OperationRegistry {
    operations: DashMap<OperationId, ExportOperation>,
    max_batch_size: usize,

    /// How long failed and cancelled operations are kept
    retention: chrono::Duration,
}

impl OperationRegistry {
    pub fn new(max_batch_size: usize, retention: std::time::Duration) -> Self {
        Self {
            operations: DashMap::new(),
            max_batch_size,
            retention: chrono::Duration::from_std(retention)
                .unwrap_or_else(|_| chrono::Duration::days(1)),
        }
    }

    /// Registers a new operation and returns its id
    ///
    /// Requests that can never run (no ids, too many ids, invalid options) are
    /// recorded directly as `Failed` with a validation error; check
    /// [`Self::status`] before scheduling.
    pub fn create(
        &self,
        kind: ExportKind,
        file_ids: Vec<FileId>,
        options: ExportOptions,
    ) -> OperationId {
        let requested = file_ids.len();
        let mut operation = ExportOperation::new(kind, file_ids, options);
        let id = operation.id.clone();

        let rejection = if requested == 0 {
            Some(CourierError::Validation("no files provided".to_string()))
        } else if requested > self.max_batch_size {
            Some(CourierError::Validation(format!(
                "batch size exceeds limit: {} > {}",
                requested, self.max_batch_size
            )))
        } else {
            operation.options.validate().err()
        };

        match rejection {
            Some(err) => {
                tracing::warn!(
                    operation_id = %id,
                    kind = %kind,
                    error = %err,
                    "Export request rejected"
                );
                operation.errors.push(ExportError::from(&err));
                self.apply_transition(&mut operation, ExportStatus::Failed);
            }
            None => {
                tracing::debug!(
                    operation_id = %id,
                    kind = %kind,
                    files = operation.total_files,
                    "Export operation created"
                );
            }
        }

        self.operations.insert(id.clone(), operation);
        id
    }

    /// Moves an operation to `new_status`
    ///
    /// Returns `false`, leaving the record untouched, when the operation is
    /// unknown or the move is not allowed from its current status.
    pub fn transition(&self, id: &OperationId, new_status: ExportStatus) -> bool {
        match self.operations.get_mut(id) {
            Some(mut entry) => self.apply_transition(&mut entry, new_status),
            None => false,
        }
    }

    fn apply_transition(&self, operation: &mut ExportOperation, new_status: ExportStatus) -> bool {
        if !operation.status.can_transition_to(new_status, operation.kind) {
            tracing::debug!(
                operation_id = %operation.id,
                from = %operation.status,
                to = %new_status,
                "Rejected status transition"
            );
            return false;
        }

        let now = Utc::now();
        operation.status = new_status;
        operation.status_history.push(new_status);
        operation.updated_at = now;

        if new_status.is_terminal() {
            operation.finished_at = Some(now);
            if new_status != ExportStatus::Completed {
                operation.expiry_time = Some(now + self.retention);
            }
        }
        true
    }

    /// Records `processed` of `total` files done and returns the new progress
    ///
    /// `processed` is clamped to `[0, total]`. Progress never decreases, so a
    /// lower value than already recorded is ignored. Terminal operations are
    /// left unchanged.
    pub fn update_progress(&self, id: &OperationId, processed: usize, total: usize) -> Option<f64> {
        let mut entry = self.operations.get_mut(id)?;
        if entry.is_terminal() {
            return Some(entry.progress);
        }

        let processed = processed.min(total);
        let progress = if total == 0 {
            0.0
        } else {
            processed as f64 / total as f64
        };

        if progress >= entry.progress {
            entry.total_files = total;
            entry.processed_files = processed;
            entry.progress = progress;
            entry.updated_at = Utc::now();
        }
        Some(entry.progress)
    }

    /// Cancels a non-terminal operation
    ///
    /// Returns `true` exactly once per operation.
    pub fn cancel(&self, id: &OperationId) -> bool {
        let cancelled = self.transition(id, ExportStatus::Cancelled);
        if cancelled {
            tracing::info!(operation_id = %id, "Export operation cancelled");
        }
        cancelled
    }

    /// Records `error` and moves the operation to `Failed`
    pub fn fail(&self, id: &OperationId, error: ExportError) -> bool {
        let Some(mut entry) = self.operations.get_mut(id) else {
            return false;
        };
        if !entry.status.can_transition_to(ExportStatus::Failed, entry.kind) {
            return false;
        }
        entry.errors.push(error);
        self.apply_transition(&mut entry, ExportStatus::Failed)
    }

    /// Completes the operation and mints its download handle
    ///
    /// `mint` runs only after the status has become `Completed`, inside the
    /// same record lock, so a cancelled or failed operation never receives a
    /// token.
    pub fn complete<F>(&self, id: &OperationId, completion: Completion, mint: F) -> bool
    where
        F: FnOnce(&ExportOperation) -> IssuedDownload,
    {
        let Some(mut entry) = self.operations.get_mut(id) else {
            return false;
        };
        if !self.apply_transition(&mut entry, ExportStatus::Completed) {
            return false;
        }

        entry.output_path = Some(completion.output_path);
        for (key, value) in completion.metadata {
            entry.metadata.insert(key, value);
        }

        let issued = mint(&entry);
        entry.download_token = Some(issued.token);
        entry.expiry_time = Some(issued.expiry_time);
        true
    }

    /// Appends a warning to a running operation
    pub fn add_warning(&self, id: &OperationId, warning: impl Into<String>) {
        if let Some(mut entry) = self.operations.get_mut(id) {
            if !entry.is_terminal() {
                entry.warnings.push(warning.into());
                entry.updated_at = Utc::now();
            }
        }
    }

    /// Marks an input id as left out of the artifact, with the reason as a warning
    pub fn add_unresolved(&self, id: &OperationId, file_id: &FileId, reason: impl Into<String>) {
        if let Some(mut entry) = self.operations.get_mut(id) {
            if entry.is_terminal() || entry.unresolved_file_ids.contains(file_id) {
                return;
            }
            entry.unresolved_file_ids.push(file_id.clone());
            entry.warnings.push(reason.into());
            entry.updated_at = Utc::now();
        }
    }

    /// Appends the "cancelled after N/M files" warning to a cancelled operation
    pub fn record_cancellation(&self, id: &OperationId) {
        if let Some(mut entry) = self.operations.get_mut(id) {
            if entry.status == ExportStatus::Cancelled {
                let warning = format!(
                    "operation cancelled after {}/{} files",
                    entry.processed_files, entry.total_files
                );
                entry.warnings.push(warning);
            }
        }
    }

    /// Stores a metadata value on a running operation
    pub fn set_metadata(&self, id: &OperationId, key: impl Into<String>, value: serde_json::Value) {
        if let Some(mut entry) = self.operations.get_mut(id) {
            if !entry.is_terminal() {
                entry.metadata.insert(key.into(), value);
            }
        }
    }

    /// Records the directory owned by the operation
    pub fn set_work_dir(&self, id: &OperationId, dir: PathBuf) {
        if let Some(mut entry) = self.operations.get_mut(id) {
            entry.work_dir = Some(dir);
        }
    }

    pub fn get(&self, id: &OperationId) -> Option<ExportOperation> {
        self.operations.get(id).map(|entry| entry.clone())
    }

    pub fn status(&self, id: &OperationId) -> Option<ExportStatus> {
        self.operations.get(id).map(|entry| entry.status)
    }

    /// Operations newest first, optionally filtered by status
    pub fn list(&self, status_filter: Option<ExportStatus>, limit: usize) -> Vec<ExportOperation> {
        let mut operations: Vec<ExportOperation> = self
            .operations
            .iter()
            .filter(|entry| status_filter.map_or(true, |status| entry.status == status))
            .map(|entry| entry.clone())
            .collect();

        operations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        operations.truncate(limit);
        operations
    }

    /// Clones every record
    pub fn snapshot(&self) -> Vec<ExportOperation> {
        self.operations.iter().map(|entry| entry.clone()).collect()
    }

    /// Removes terminal operations whose retention has passed and returns them
    pub fn evict_expired(&self, now: DateTime<Utc>) -> Vec<ExportOperation> {
        let expired: Vec<OperationId> = self
            .operations
            .iter()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| {
                self.operations
                    .remove_if(&id, |_, operation| operation.is_expired(now))
                    .map(|(_, operation)| operation)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
