//! Core business logic for Courier.
//!
//! This module contains the export engine: operation state, concurrency
//! control, archive building, download tokens and the orchestrator tying
//! them together.
//!
//! # Modules
//!
//! - [`export`] - Export orchestration and per-kind handlers
//! - [`state`] - Operation registry and state machine enforcement
//! - [`concurrency`] - Heavy-export semaphore and progress reporting
//! - [`archive`] - Placement plans, ZIP writing and manifests
//! - [`downloads`] - Download tokens and the cleanup sweeper
//! - [`verification`] - Checksums and archive read-back
//!
//! # Export Workflow
//!
//! 1. **Submit**: the request is validated and recorded as `Pending`
//! 2. **Acquire**: heavy kinds wait briefly for a concurrency slot
//! 3. **Resolve**: every file id is looked up in the artifact store
//! 4. **Produce**: files are transformed, archived or rendered
//! 5. **Complete**: the artifact gets an expiring download token
//! 6. **Sweep**: expired operations and their files are removed
//!
//! # Example
//!
//! ```rust,no_run
//! use courier::adapters::{Collaborators, InMemoryArtifactStore};
//! use courier::config::CourierConfig;
//! use courier::core::export::ExportOrchestrator;
//! use courier::domain::{ExportKind, ExportOptions, FileId};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryArtifactStore::new());
//! let orchestrator =
//!     ExportOrchestrator::new(CourierConfig::default(), Collaborators::with_store(store)).await?;
//!
//! let id = orchestrator.submit_export(
//!     ExportKind::ZipArchive,
//!     vec![FileId::new("a.png")?, FileId::new("b.png")?],
//!     ExportOptions::default(),
//! );
//!
//! let operation = orchestrator.wait_for_completion(&id).await;
//! println!("{:?}", operation.map(|op| op.status));
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod concurrency;
pub mod downloads;
pub mod export;
pub mod state;
pub mod verification;
