//! Export orchestration
//!
//! This module provides the export engine's entry point and its per-kind
//! handlers:
//! - [`ExportOrchestrator`] accepts requests and drives operations
//! - `batch` converts single files and batches
//! - `packaging` builds ZIP archives
//! - `portfolio` renders HTML portfolios
//! - [`summary`] aggregates statistics and formats reports

mod batch;
mod job;
pub mod orchestrator;
mod packaging;
mod portfolio;
pub mod summary;

pub use orchestrator::ExportOrchestrator;
pub use summary::{format_operation, ExportStatistics};
