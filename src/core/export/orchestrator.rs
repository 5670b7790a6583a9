//! Export orchestrator - public entry point of the export engine
//!
//! The orchestrator owns the operation registry, the download token table, the
//! concurrency controller and the cleanup sweeper. Every accepted request is
//! driven by one spawned worker:
//!
//! 1. acquire a concurrency slot (heavy kinds only)
//! 2. `Pending -> Preparing`, create the operation directory
//! 3. run the kind's handler under the operation's time budget
//! 4. complete the record and mint its download token, or record the failure
//!
//! Cancellation is cooperative: `cancel_operation` marks the record and fires
//! the operation's [`CancellationToken`], which handlers poll at every per-file
//! checkpoint.

use crate::adapters::Collaborators;
use crate::config::CourierConfig;
use crate::core::concurrency::{ConcurrencyController, ExportPermit, ProgressCallback};
use crate::core::downloads::{CleanupSweeper, DownloadToken, DownloadTokenManager};
use crate::core::export::job::{ExportJob, JobOutcome};
use crate::core::export::summary::ExportStatistics;
use crate::core::export::{batch, packaging, portfolio};
use crate::core::state::{IssuedDownload, OperationRegistry};
use crate::domain::errors::{CourierError, ExportError};
use crate::domain::ids::{FileId, OperationId};
use crate::domain::operation::{ExportKind, ExportOperation, ExportStatus};
use crate::domain::options::ExportOptions;
use crate::domain::Result;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle kept for an operation while its worker runs
#[derive(Clone)]
struct RunningOperation {
    cancel: CancellationToken,
    done: watch::Receiver<bool>,
}

/// Shared state handed to each worker
#[derive(Clone)]
struct WorkerContext {
    config: Arc<CourierConfig>,
    registry: Arc<OperationRegistry>,
    tokens: Arc<DownloadTokenManager>,
    limiter: ConcurrencyController,
    collaborators: Collaborators,
    running: Arc<DashMap<OperationId, RunningOperation>>,
}

/// Export orchestrator
pub struct ExportOrchestrator {
    context: WorkerContext,
    shutdown: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl ExportOrchestrator {
    /// Create a new orchestrator
    ///
    /// Validates the configuration, creates the export directory and starts
    /// the cleanup sweeper unless `downloads.cleanup_interval_secs` is 0.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for an invalid configuration or an
    /// export directory that cannot be created.
    pub async fn new(config: CourierConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate().map_err(CourierError::Configuration)?;

        tokio::fs::create_dir_all(&config.export.export_dir)
            .await
            .map_err(|e| {
                CourierError::Configuration(format!(
                    "Failed to create export directory {}: {}",
                    config.export.export_dir.display(),
                    e
                ))
            })?;

        let registry = Arc::new(OperationRegistry::new(
            config.export.max_batch_size,
            config.downloads.token_ttl(),
        ));
        let tokens = Arc::new(DownloadTokenManager::new());
        let limiter = ConcurrencyController::new(
            config.export.max_concurrent_exports,
            config.export.acquire_timeout(),
        );

        let shutdown = CancellationToken::new();
        let sweeper = config.downloads.cleanup_interval().map(|interval| {
            CleanupSweeper::new(registry.clone(), tokens.clone())
                .spawn(interval, shutdown.child_token())
        });

        tracing::info!(
            export_dir = %config.export.export_dir.display(),
            max_concurrent_exports = config.export.max_concurrent_exports,
            max_batch_size = config.export.max_batch_size,
            sweeper = sweeper.is_some(),
            "Export orchestrator initialized"
        );

        Ok(Self {
            context: WorkerContext {
                config: Arc::new(config),
                registry,
                tokens,
                limiter,
                collaborators,
                running: Arc::new(DashMap::new()),
            },
            shutdown,
            sweeper: Mutex::new(sweeper),
        })
    }

    /// Accepts an export request and returns its operation id immediately
    ///
    /// Requests rejected at creation (no ids, oversized batch, invalid
    /// options) are recorded as `Failed` and never scheduled.
    pub fn submit_export(
        &self,
        kind: ExportKind,
        file_ids: Vec<FileId>,
        options: ExportOptions,
    ) -> OperationId {
        self.submit(kind, file_ids, options, None)
    }

    /// Like [`Self::submit_export`], calling `callback` with the operation's
    /// progress after every file
    pub fn submit_export_with_progress<F>(
        &self,
        kind: ExportKind,
        file_ids: Vec<FileId>,
        options: ExportOptions,
        callback: F,
    ) -> OperationId
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.submit(kind, file_ids, options, Some(Arc::new(callback)))
    }

    fn submit(
        &self,
        kind: ExportKind,
        file_ids: Vec<FileId>,
        options: ExportOptions,
        progress: Option<ProgressCallback>,
    ) -> OperationId {
        let ctx = &self.context;
        let id = ctx.registry.create(kind, file_ids, options);
        if ctx.registry.status(&id) != Some(ExportStatus::Pending) {
            return id;
        }

        let cancel = self.shutdown.child_token();
        let (done_tx, done_rx) = watch::channel(false);
        ctx.running.insert(
            id.clone(),
            RunningOperation {
                cancel: cancel.clone(),
                done: done_rx,
            },
        );

        let worker = ctx.clone();
        let operation_id = id.clone();
        tokio::spawn(async move {
            worker.run(&operation_id, cancel, progress).await;
            let _ = done_tx.send(true);
            worker.running.remove(&operation_id);
        });

        id
    }

    /// Snapshot of one operation
    pub fn get_operation(&self, id: &OperationId) -> Option<ExportOperation> {
        self.context.registry.get(id)
    }

    /// Operations newest first, optionally filtered by status
    pub fn list_operations(
        &self,
        status_filter: Option<ExportStatus>,
        limit: usize,
    ) -> Vec<ExportOperation> {
        self.context.registry.list(status_filter, limit)
    }

    /// Cancels a non-terminal operation
    ///
    /// Returns `true` exactly once per operation. Pending store lookups,
    /// transforms and renders are abandoned and the worker stops at its next
    /// checkpoint; files already written stay in place.
    pub fn cancel_operation(&self, id: &OperationId) -> bool {
        if !self.context.registry.cancel(id) {
            return false;
        }
        if let Some(running) = self.context.running.get(id) {
            running.cancel.cancel();
        }
        true
    }

    /// Looks up an unexpired download token
    pub fn resolve_download(&self, token: &str) -> Option<DownloadToken> {
        self.context.tokens.resolve(token)
    }

    pub fn get_statistics(&self) -> ExportStatistics {
        ExportStatistics::from_operations(&self.context.registry.snapshot(), Utc::now())
    }

    /// Runs one cleanup sweep now and returns the number of paths removed
    pub async fn sweep_expired(&self) -> usize {
        CleanupSweeper::new(self.context.registry.clone(), self.context.tokens.clone())
            .sweep()
            .await
            .paths_removed
    }

    /// Waits until the worker driving `id` has written its final state
    ///
    /// Returns immediately for finished and unknown operations.
    pub async fn wait_for_completion(&self, id: &OperationId) -> Option<ExportOperation> {
        let running = self.context.running.get(id).map(|entry| entry.clone());
        if let Some(mut running) = running {
            // A closed channel means the worker is gone either way
            let _ = running.done.wait_for(|done| *done).await;
        }
        self.context.registry.get(id)
    }

    /// Number of heavy operations currently holding a slot
    pub fn active_exports(&self) -> usize {
        self.context.limiter.active()
    }

    pub fn config(&self) -> &CourierConfig {
        &self.context.config
    }

    /// Stops the sweeper and cancels every running operation
    ///
    /// Waits up to `export.shutdown_timeout_secs` for workers to reach a
    /// checkpoint. Operations submitted afterwards are cancelled before they
    /// start.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down export orchestrator");
        self.shutdown.cancel();
        self.context.limiter.close();

        if let Some(handle) = self.sweeper.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Cleanup sweeper ended abnormally");
            }
        }

        let running: Vec<(OperationId, RunningOperation)> = self
            .context
            .running
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (id, operation) in &running {
            self.context.registry.cancel(id);
            operation.cancel.cancel();
        }

        let grace = Duration::from_secs(self.context.config.export.shutdown_timeout_secs);
        let pending = running.len();
        let waits = futures::future::join_all(running.into_iter().map(|(_, mut operation)| {
            async move {
                let _ = operation.done.wait_for(|done| *done).await;
            }
        }));

        if tokio::time::timeout(grace, waits).await.is_err() {
            tracing::warn!(
                pending,
                timeout_secs = grace.as_secs(),
                "Shutdown timed out waiting for export workers"
            );
        } else {
            tracing::info!(cancelled = pending, "Export orchestrator stopped");
        }
    }
}

impl Drop for ExportOrchestrator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl WorkerContext {
    /// Drives one operation to a terminal status
    async fn run(
        &self,
        id: &OperationId,
        cancel: CancellationToken,
        progress: Option<ProgressCallback>,
    ) {
        let Some(operation) = self.registry.get(id) else {
            return;
        };
        let started = Instant::now();
        crate::log_operation_start!(id, operation.kind, operation.total_files);

        if cancel.is_cancelled() {
            self.registry.cancel(id);
            self.registry.record_cancellation(id);
            self.log_finished(id, started);
            return;
        }

        let _permit = match self.acquire(&operation).await {
            Ok(permit) => permit,
            Err(e) => {
                if !self.registry.fail(id, ExportError::from(&e)) {
                    self.registry.record_cancellation(id);
                }
                self.log_finished(id, started);
                return;
            }
        };

        if !self.registry.transition(id, ExportStatus::Preparing) {
            self.registry.record_cancellation(id);
            self.log_finished(id, started);
            return;
        }

        match self.prepare(&operation, cancel, progress).await {
            Ok(job) => self.execute(job).await,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to prepare export");
                self.registry.fail(id, ExportError::from(&e));
            }
        }

        self.log_finished(id, started);
    }

    async fn acquire(&self, operation: &ExportOperation) -> Result<Option<ExportPermit>> {
        if operation.kind.is_heavy() {
            self.limiter.acquire().await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Creates the operation directory and builds the job
    async fn prepare(
        &self,
        operation: &ExportOperation,
        cancel: CancellationToken,
        progress: Option<ProgressCallback>,
    ) -> Result<ExportJob> {
        let work_dir = self.config.export.export_dir.join(format!(
            "{}_{}",
            operation.kind.dir_prefix(),
            operation.id
        ));
        tokio::fs::create_dir_all(&work_dir).await.map_err(|e| {
            CourierError::ArchiveWrite(format!(
                "failed to create {}: {e}",
                work_dir.display()
            ))
        })?;
        self.registry.set_work_dir(&operation.id, work_dir.clone());

        Ok(ExportJob {
            id: operation.id.clone(),
            kind: operation.kind,
            file_ids: operation.unique_file_ids(),
            options: operation.options.clone(),
            work_dir,
            config: self.config.clone(),
            registry: self.registry.clone(),
            collaborators: self.collaborators.clone(),
            cancel,
            progress,
        })
    }

    /// Runs the handler under the time budget and records the outcome
    async fn execute(&self, job: ExportJob) {
        let id = job.id.clone();
        let cancel = job.cancel.clone();
        let budget = self.config.export.operation_timeout(job.total());

        let mut handle = tokio::spawn(async move { run_handler(&job).await });

        let (joined, timed_out) = tokio::select! {
            joined = &mut handle => (joined, false),
            _ = tokio::time::sleep(budget) => {
                tracing::warn!(
                    operation_id = %id,
                    budget_secs = budget.as_secs(),
                    "Export operation exceeded its time budget"
                );
                cancel.cancel();
                ((&mut handle).await, true)
            }
        };

        if timed_out {
            self.fail_timeout(&id);
            return;
        }

        match joined {
            Ok(Ok(JobOutcome::Finished(completion))) => {
                let artifact = completion.output_path.clone();
                let ttl = self.config.downloads.token_ttl();
                let completed = self.registry.complete(&id, completion, |operation| {
                    let issued = self
                        .tokens
                        .issue(artifact, ttl, token_metadata(operation));
                    IssuedDownload {
                        token: issued.token,
                        expiry_time: issued.expiry_time,
                    }
                });
                if !completed {
                    self.registry.record_cancellation(&id);
                }
            }
            Ok(Ok(JobOutcome::Interrupted)) => {
                if self.registry.status(&id) == Some(ExportStatus::Cancelled) {
                    self.registry.record_cancellation(&id);
                } else {
                    self.registry.fail(
                        &id,
                        ExportError::from(CourierError::Other("operation interrupted".to_string())),
                    );
                }
            }
            Ok(Err(e)) => {
                crate::log_error_with_context!(&e, format!("Export operation {id} failed"));
                if !self.registry.fail(&id, ExportError::from(&e)) {
                    self.registry.record_cancellation(&id);
                }
            }
            Err(e) => {
                let error = CourierError::Other(format!("export worker stopped: {e}"));
                crate::log_error_with_context!(&error, format!("Export operation {id} failed"));
                self.registry.fail(&id, ExportError::from(&error));
            }
        }
    }

    fn fail_timeout(&self, id: &OperationId) {
        let Some(operation) = self.registry.get(id) else {
            return;
        };
        let error = CourierError::Timeout(format!(
            "operation timed out after {}/{} files",
            operation.processed_files, operation.total_files
        ));
        if !self.registry.fail(id, ExportError::from(&error)) {
            self.registry.record_cancellation(id);
        }
    }

    fn log_finished(&self, id: &OperationId, started: Instant) {
        if let Some(operation) = self.registry.get(id) {
            crate::log_operation_complete!(
                id,
                operation.status,
                operation.processed_files,
                operation.total_files,
                started.elapsed()
            );
        }
    }
}

async fn run_handler(job: &ExportJob) -> Result<JobOutcome> {
    match job.kind {
        ExportKind::SingleFile | ExportKind::BatchFiles => batch::export_files(job).await,
        ExportKind::ZipArchive => packaging::export_zip(job).await,
        ExportKind::HtmlPortfolio => portfolio::export_portfolio(job).await,
    }
}

fn token_metadata(operation: &ExportOperation) -> BTreeMap<String, serde_json::Value> {
    let mut metadata = BTreeMap::new();
    metadata.insert("operation_id".to_string(), json!(operation.id));
    metadata.insert("kind".to_string(), json!(operation.kind));
    metadata.insert("file_count".to_string(), json!(operation.processed_files));
    if let Some(name) = operation.metadata.get("archive_name") {
        metadata.insert("archive_name".to_string(), name.clone());
    }
    metadata
}
