//! Domain error types
//!
//! This module defines the error hierarchy for Courier. Whole-operation failures
//! are expressed as [`CourierError`]; the classification recorded on an
//! operation is [`ExportErrorType`].
//! All errors are domain-specific and don't expose third-party types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main Courier error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request rejected before any work started (empty/oversized batch,
    /// unknown structure mode, out-of-range options, archive limits)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A file identifier could not be resolved
    #[error("Not found: {0}")]
    NotFound(String),

    /// No concurrency slot became free within the acquire deadline
    #[error("Concurrency limit reached: {0}")]
    ConcurrencyExceeded(String),

    /// Writing an archive or output file failed
    #[error("Archive write error: {0}")]
    ArchiveWrite(String),

    /// The file transformer rejected or failed on a file
    #[error("Transform error: {0}")]
    Transform(String),

    /// The operation ran past its wall-clock budget
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Portfolio rendering failed
    #[error("Render error: {0}")]
    Render(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl CourierError {
    /// Classification used when the error is recorded on an operation
    pub fn error_type(&self) -> ExportErrorType {
        match self {
            CourierError::Configuration(_) => ExportErrorType::Configuration,
            CourierError::Validation(_) => ExportErrorType::Validation,
            CourierError::NotFound(_) => ExportErrorType::NotFound,
            CourierError::ConcurrencyExceeded(_) => ExportErrorType::ConcurrencyExceeded,
            CourierError::ArchiveWrite(_) | CourierError::Io(_) => ExportErrorType::ArchiveWrite,
            CourierError::Transform(_) => ExportErrorType::Transform,
            CourierError::Timeout(_) => ExportErrorType::Timeout,
            CourierError::Render(_) => ExportErrorType::Render,
            CourierError::Serialization(_) | CourierError::Other(_) => ExportErrorType::Unknown,
        }
    }

    /// Message without the category prefix added by `Display`
    pub fn message(&self) -> &str {
        match self {
            CourierError::Configuration(m)
            | CourierError::Validation(m)
            | CourierError::NotFound(m)
            | CourierError::ConcurrencyExceeded(m)
            | CourierError::ArchiveWrite(m)
            | CourierError::Transform(m)
            | CourierError::Timeout(m)
            | CourierError::Render(m)
            | CourierError::Serialization(m)
            | CourierError::Io(m)
            | CourierError::Other(m) => m,
        }
    }
}

/// Type of error recorded on an export operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportErrorType {
    /// Request rejected before work started
    Validation,
    /// Input file could not be resolved
    NotFound,
    /// Concurrency slot not available in time
    ConcurrencyExceeded,
    /// Archive or output file could not be written
    ArchiveWrite,
    /// File transformer failure
    Transform,
    /// Operation exceeded its time budget
    Timeout,
    /// Portfolio rendering failure
    Render,
    /// Configuration error
    Configuration,
    /// Unknown error
    Unknown,
}

/// Export error with context, as stored in an operation's `errors` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportError {
    /// Type of error
    pub error_type: ExportErrorType,

    /// Error message
    pub message: String,

    /// Optional context (e.g., file id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ExportError {
    /// Create a new export error
    pub fn new(error_type: ExportErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            context: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl From<&CourierError> for ExportError {
    fn from(err: &CourierError) -> Self {
        ExportError::new(err.error_type(), err.message())
    }
}

impl From<CourierError> for ExportError {
    fn from(err: CourierError) -> Self {
        ExportError::from(&err)
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{} ({})", self.message, context),
            None => write!(f, "{}", self.message),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for CourierError {
    fn from(err: std::io::Error) -> Self {
        CourierError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CourierError {
    fn from(err: serde_json::Error) -> Self {
        CourierError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CourierError {
    fn from(err: toml::de::Error) -> Self {
        CourierError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<zip::result::ZipError> for CourierError {
    fn from(err: zip::result::ZipError) -> Self {
        CourierError::ArchiveWrite(err.to_string())
    }
}
