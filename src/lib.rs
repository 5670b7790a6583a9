// Courier - Asynchronous Export Engine
// Copyright (c) 2025 Courier Contributors
// Licensed under the MIT License

//! # Courier - Asynchronous Export Engine
//!
//! Courier turns previously stored files into derived artifacts (converted
//! copies, structured ZIP archives and HTML portfolios) without blocking the
//! caller while the work happens.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Tracking** every export as an asynchronous operation with a strict
//!   forward-only lifecycle
//! - **Bounding** how many heavy exports run at once
//! - **Building** ZIP archives with placement plans, manifests and volumes
//! - **Issuing** expiring download tokens and cleaning up expired artifacts
//!
//! ## Architecture
//!
//! Courier follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (orchestration, state, archives, downloads)
//! - [`adapters`] - External collaborators (artifact store, transformer, renderer)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier::adapters::create_local_collaborators;
//! use courier::config::load_config;
//! use courier::core::export::ExportOrchestrator;
//! use courier::domain::{ExportKind, ExportOptions, FileId, StructureMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("courier.toml")?;
//!     let collaborators = create_local_collaborators(&config.storage);
//!     let orchestrator = ExportOrchestrator::new(config, collaborators).await?;
//!
//!     let id = orchestrator.submit_export(
//!         ExportKind::ZipArchive,
//!         vec![FileId::new("renders/a.png")?, FileId::new("renders/b.png")?],
//!         ExportOptions::default().with_structure(StructureMode::ByType),
//!     );
//!
//!     if let Some(operation) = orchestrator.wait_for_completion(&id).await {
//!         if let Some(token) = operation.download_token {
//!             let download = orchestrator.resolve_download(&token);
//!             println!("{:?}", download.map(|d| d.artifact_path));
//!         }
//!     }
//!
//!     orchestrator.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Courier uses the [`domain::CourierError`] type for all errors. Failures
//! recorded on an operation are kept as [`domain::ExportError`] values with
//! a classification:
//!
//! ```rust
//! use courier::domain::{CourierError, ExportError, ExportErrorType};
//!
//! let error = CourierError::NotFound("no valid files found".to_string());
//! let recorded = ExportError::from(&error);
//! assert_eq!(recorded.error_type, ExportErrorType::NotFound);
//! ```
//!
//! ## Logging
//!
//! Courier uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(operation_id = "op-1", "Starting export");
//! warn!(file_id = "a.png", "File left out of export");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
