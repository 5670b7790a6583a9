//! Logging and observability
//!
//! Structured logging through `tracing`, with:
//! - Console output
//! - JSON-formatted file logs with rotation
//! - Configurable log levels, overridable with `RUST_LOG`
//!
//! # Example
//!
//! ```no_run
//! use courier::logging::init_logging;
//! use courier::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export operation
///
/// # Example
///
/// ```no_run
/// use courier::log_operation_start;
/// use courier::domain::{ExportKind, OperationId};
///
/// let id = OperationId::generate();
/// log_operation_start!(&id, ExportKind::ZipArchive, 12);
/// ```
#[macro_export]
macro_rules! log_operation_start {
    ($operation_id:expr, $kind:expr, $files:expr) => {
        tracing::info!(
            operation_id = %$operation_id,
            kind = %$kind,
            files = $files,
            "Starting export operation"
        );
    };
}

/// Log the end of an export operation
///
/// # Example
///
/// ```no_run
/// use courier::log_operation_complete;
/// use courier::domain::{ExportStatus, OperationId};
/// use std::time::Duration;
///
/// let id = OperationId::generate();
/// log_operation_complete!(&id, ExportStatus::Completed, 10, 12, Duration::from_secs(3));
/// ```
#[macro_export]
macro_rules! log_operation_complete {
    ($operation_id:expr, $status:expr, $processed:expr, $total:expr, $duration:expr) => {
        tracing::info!(
            operation_id = %$operation_id,
            status = %$status,
            processed = $processed,
            total = $total,
            duration_ms = $duration.as_millis() as u64,
            "Export operation finished"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use courier::log_error_with_context;
/// use courier::domain::CourierError;
///
/// let error = CourierError::ArchiveWrite("disk full".to_string());
/// log_error_with_context!(&error, "Failed to finish archive");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
