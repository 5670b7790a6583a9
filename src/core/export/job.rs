//! Shared state of one running export
//!
//! A job is owned by the single worker that drives the operation. Handlers
//! read inputs from it and report through the registry.

use crate::adapters::Collaborators;
use crate::config::CourierConfig;
use crate::core::concurrency::{ProgressCallback, ProgressTracker};
use crate::core::state::{Completion, OperationRegistry};
use crate::domain::artifact::StoredArtifact;
use crate::domain::ids::{FileId, OperationId};
use crate::domain::operation::{ExportKind, ExportStatus};
use crate::domain::options::ExportOptions;
use crate::domain::Result;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a handler needs to run one operation
pub(crate) struct ExportJob {
    pub id: OperationId,
    pub kind: ExportKind,

    /// Unique input ids in first-occurrence order
    pub file_ids: Vec<FileId>,
    pub options: ExportOptions,

    /// Directory owned by this operation
    pub work_dir: PathBuf,
    pub config: Arc<CourierConfig>,
    pub registry: Arc<OperationRegistry>,
    pub collaborators: Collaborators,
    pub cancel: CancellationToken,
    pub progress: Option<ProgressCallback>,
}

/// Awaits `work` unless `cancel` fires first
///
/// Collaborator calls go through here so a hung lookup or transform cannot
/// outlive the operation's time budget. On cancellation the future is dropped
/// at its current await point and `None` is returned.
pub(crate) async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    work: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        output = work => Some(output),
    }
}

/// How a handler stopped
pub(crate) enum JobOutcome {
    /// The artifact is ready; the operation may complete
    Finished(Completion),

    /// Cancellation was observed at a checkpoint
    Interrupted,
}

impl ExportJob {
    pub fn total(&self) -> usize {
        self.file_ids.len()
    }

    pub fn tracker(&self) -> ProgressTracker {
        ProgressTracker::new(
            self.registry.clone(),
            self.id.clone(),
            self.total(),
            self.progress.clone(),
        )
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Moves the operation into `status`
    ///
    /// Returns `false` when the move was refused, which only happens after the
    /// operation was cancelled concurrently.
    pub fn enter(&self, status: ExportStatus) -> bool {
        self.registry.transition(&self.id, status)
    }

    /// Records an input left out of the artifact
    pub fn skip(&self, tracker: &mut ProgressTracker, file_id: &FileId, reason: String) {
        tracing::warn!(
            operation_id = %self.id,
            file_id = %file_id,
            reason = %reason,
            "File left out of export"
        );
        self.registry.add_unresolved(&self.id, file_id, reason);
        tracker.file_skipped();
    }

    /// Resolves every input through the artifact store
    ///
    /// Lookups run concurrently, bounded by `export.file_workers`, but results
    /// are handled in input order. Unknown ids and lookup failures become
    /// warnings. Returns `None` when cancellation was observed.
    pub async fn resolve_inputs(
        &self,
        tracker: &mut ProgressTracker,
    ) -> Result<Option<Vec<StoredArtifact>>> {
        let store = self.collaborators.store.clone();
        let cancel = self.cancel.clone();
        let mut lookups = stream::iter(self.file_ids.clone())
            .map(move |file_id| {
                let store = store.clone();
                let cancel = cancel.clone();
                async move {
                    let resolved = until_cancelled(&cancel, store.resolve(&file_id)).await?;
                    Some((file_id, resolved))
                }
            })
            .buffered(self.config.export.file_workers);

        let mut resolved = Vec::with_capacity(self.total());
        while let Some(lookup) = lookups.next().await {
            let Some((file_id, result)) = lookup else {
                return Ok(None);
            };
            if self.is_cancelled() {
                return Ok(None);
            }
            match result {
                Ok(Some(artifact)) => resolved.push(artifact),
                Ok(None) => self.skip(tracker, &file_id, format!("file not found: {file_id}")),
                Err(e) => self.skip(
                    tracker,
                    &file_id,
                    format!("failed to resolve {file_id}: {}", e.message()),
                ),
            }
        }

        tracing::debug!(
            operation_id = %self.id,
            resolved = resolved.len(),
            requested = self.total(),
            "Resolved export inputs"
        );
        Ok(Some(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_until_cancelled_returns_output() {
        let cancel = CancellationToken::new();
        assert_eq!(until_cancelled(&cancel, async { 7 }).await, Some(7));
    }

    #[tokio::test]
    async fn test_until_cancelled_abandons_pending_work() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(2),
            until_cancelled(&cancel, std::future::pending::<()>()),
        )
        .await
        .expect("cancellation was not observed");
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_until_cancelled_prefers_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(until_cancelled(&cancel, async { 7 }).await, None);
    }
}
