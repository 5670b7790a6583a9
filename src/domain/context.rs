//! Error context extension trait
//!
//! Works like `anyhow::Context` for `Result<T, CourierError>`, with one
//! difference: the context is prefixed to the message while the error
//! variant is kept, so the classification recorded on an operation
//! (`ArchiveWrite`, `NotFound`, ...) survives the added context.
//!
//! # Examples
//!
//! ```rust
//! use courier::domain::Result;
//! use courier::domain::context::ResultExt;
//!
//! fn read_manifest(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .context(format!("Failed to read manifest: {}", path))
//! }
//! ```

use crate::domain::errors::CourierError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error using a closure, evaluated only on error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<CourierError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| prefix(e.into(), &context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let context = f();
            prefix(e.into(), &context)
        })
    }
}

fn prefix(err: CourierError, context: &dyn std::fmt::Display) -> CourierError {
    let message = format!("{context}: {}", err.message());
    match err {
        CourierError::Configuration(_) => CourierError::Configuration(message),
        CourierError::Validation(_) => CourierError::Validation(message),
        CourierError::NotFound(_) => CourierError::NotFound(message),
        CourierError::ConcurrencyExceeded(_) => CourierError::ConcurrencyExceeded(message),
        CourierError::ArchiveWrite(_) => CourierError::ArchiveWrite(message),
        CourierError::Transform(_) => CourierError::Transform(message),
        CourierError::Timeout(_) => CourierError::Timeout(message),
        CourierError::Render(_) => CourierError::Render(message),
        CourierError::Serialization(_) => CourierError::Serialization(message),
        CourierError::Io(_) => CourierError::Io(message),
        CourierError::Other(_) => CourierError::Other(message),
    }
}
