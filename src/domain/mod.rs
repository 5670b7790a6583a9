//! Domain models and types for Courier.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`OperationId`], [`FileId`])
//! - **Operation model and state machine** ([`ExportOperation`], [`ExportKind`], [`ExportStatus`])
//! - **Request options** ([`ExportOptions`], [`StructureMode`], [`CompressionSettings`])
//! - **Resolved inputs** ([`StoredArtifact`])
//! - **Error types** ([`CourierError`], [`ExportError`])
//! - **Result type alias** ([`Result`])
//!
//! # State machine
//!
//! ```rust
//! use courier::domain::{ExportKind, ExportStatus};
//!
//! // A ZIP archive is packaged, never "exported"
//! assert!(ExportStatus::Preparing.can_transition_to(ExportStatus::Packaging, ExportKind::ZipArchive));
//! assert!(!ExportStatus::Preparing.can_transition_to(ExportStatus::Exporting, ExportKind::ZipArchive));
//! ```

pub mod artifact;
pub mod context;
pub mod errors;
pub mod ids;
pub mod operation;
pub mod options;
pub mod result;

// Re-export commonly used types for convenience
pub use artifact::StoredArtifact;
pub use errors::{CourierError, ExportError, ExportErrorType};
pub use ids::{FileId, OperationId};
pub use operation::{ExportKind, ExportOperation, ExportStatus};
pub use options::{
    CompressionMethod, CompressionSettings, ExportOptions, OutputFormat, PortfolioOptions,
    StructureMode, TransformSpec,
};
pub use result::Result;
