//! Periodic cleanup of expired operations and tokens
//!
//! One sweep evicts every expired download token and every terminal operation
//! past its expiry, then deletes the files and directories they referenced.

use crate::core::downloads::tokens::DownloadTokenManager;
use crate::core::state::OperationRegistry;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What one sweep removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub operations_evicted: usize,
    pub tokens_evicted: usize,

    /// Files and directories deleted from disk
    pub paths_removed: usize,
}

/// Evicts expired state and deletes the artifacts behind it
#[derive(Clone)]
pub struct CleanupSweeper {
    registry: Arc<OperationRegistry>,
    tokens: Arc<DownloadTokenManager>,
}

impl CleanupSweeper {
    pub fn new(registry: Arc<OperationRegistry>, tokens: Arc<DownloadTokenManager>) -> Self {
        Self { registry, tokens }
    }

    /// Runs one sweep against the current time
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Runs one sweep against an explicit clock
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let operations = self.registry.evict_expired(now);
        let tokens = self.tokens.evict_expired(now);

        let mut report = SweepReport {
            operations_evicted: operations.len(),
            tokens_evicted: tokens.len(),
            paths_removed: 0,
        };

        let mut removed: Vec<PathBuf> = Vec::new();
        let candidates = operations
            .iter()
            .filter_map(|op| op.work_dir.clone().or_else(|| op.output_path.clone()))
            .chain(tokens.into_iter().map(|t| t.artifact_path));

        for path in candidates {
            if removed.iter().any(|dir| path.starts_with(dir)) {
                continue;
            }
            match remove_path(&path).await {
                Ok(true) => {
                    tracing::debug!(path = %path.display(), "Removed expired artifact");
                    report.paths_removed += 1;
                    removed.push(path);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to remove expired artifact"
                    );
                }
            }
        }

        if report != SweepReport::default() {
            tracing::info!(
                operations = report.operations_evicted,
                tokens = report.tokens_evicted,
                paths = report.paths_removed,
                "Cleanup sweep completed"
            );
        }
        report
    }

    /// Starts the periodic sweep; it stops when `shutdown` is cancelled
    pub fn spawn(self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            // The first tick completes immediately
            ticker.tick().await;
            tracing::debug!(interval_secs = interval.as_secs(), "Cleanup sweeper started");

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        self.sweep().await;
                    }
                }
            }

            tracing::debug!("Cleanup sweeper stopped");
        })
    }
}

/// Deletes a file or directory tree, `Ok(false)` when nothing was there
async fn remove_path(path: &Path) -> std::io::Result<bool> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await?;
    } else {
        tokio::fs::remove_file(path).await?;
    }
    Ok(true)
}
