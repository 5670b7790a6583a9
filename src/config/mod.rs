//! Configuration management for Courier.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Courier uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `COURIER_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use courier::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("courier.toml")?;
//!
//! println!("Exports go to: {}", config.export.export_dir.display());
//! println!("Concurrent exports: {}", config.export.max_concurrent_exports);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`ExportConfig`] - Export directory, batch limits, concurrency and timeouts
//! - [`ArchiveConfig`] - Archive size limits, volumes and verification
//! - [`DownloadsConfig`] - Token lifetime and cleanup interval
//! - [`StorageConfig`] - Source directory for the local artifact store
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [export]
//! export_dir = "${COURIER_DATA}/exports"
//! max_batch_size = 50
//! max_concurrent_exports = 3
//!
//! [archive]
//! max_archive_size_mb = 1000
//! volume_size_mb = 0
//!
//! [downloads]
//! token_ttl_secs = 86400
//! cleanup_interval_secs = 3600
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, ArchiveConfig, CourierConfig, DownloadsConfig, ExportConfig, LoggingConfig,
    StorageConfig,
};
