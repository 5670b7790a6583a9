//! Configuration schema types
//!
//! This module defines the configuration structure for Courier. Every section
//! has serde defaults, so an empty TOML file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main Courier configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CourierConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Export scheduling and limits
    #[serde(default)]
    pub export: ExportConfig,

    /// Archive builder settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Download token settings
    #[serde(default)]
    pub downloads: DownloadsConfig,

    /// Local artifact store used by the CLI
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CourierConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.export.validate()?;
        self.archive.validate()?;
        self.downloads.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Export scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Root directory holding one subdirectory per operation
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Maximum number of file ids accepted in one request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Heavy operations (batch, archive, portfolio) allowed to run at once
    #[serde(default = "default_max_concurrent_exports")]
    pub max_concurrent_exports: usize,

    /// How long a heavy operation waits for a free slot before failing
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// Per-operation worker pool size for file resolution and transforms
    #[serde(default = "default_file_workers")]
    pub file_workers: usize,

    /// Fixed part of the per-operation time budget
    #[serde(default = "default_timeout_base_secs")]
    pub timeout_base_secs: u64,

    /// Time budget added per unique input file
    #[serde(default = "default_timeout_per_file_ms")]
    pub timeout_per_file_ms: u64,

    /// Quality used by the CLI when none is given (1-100)
    #[serde(default = "default_quality")]
    pub default_quality: u8,

    /// Graceful shutdown timeout in seconds
    /// Maximum time the binary waits for running operations after Ctrl+C.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_dir: default_export_dir(),
            max_batch_size: default_max_batch_size(),
            max_concurrent_exports: default_max_concurrent_exports(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            file_workers: default_file_workers(),
            timeout_base_secs: default_timeout_base_secs(),
            timeout_per_file_ms: default_timeout_per_file_ms(),
            default_quality: default_quality(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.export_dir.as_os_str().is_empty() {
            return Err("export.export_dir cannot be empty".to_string());
        }

        if self.max_batch_size == 0 {
            return Err("export.max_batch_size must be > 0".to_string());
        }

        if self.max_concurrent_exports == 0 || self.max_concurrent_exports > 64 {
            return Err("export.max_concurrent_exports must be between 1 and 64".to_string());
        }

        if self.file_workers == 0 || self.file_workers > 64 {
            return Err("export.file_workers must be between 1 and 64".to_string());
        }

        if !(1..=100).contains(&self.default_quality) {
            return Err("export.default_quality must be between 1 and 100".to_string());
        }

        if self.shutdown_timeout_secs == 0 {
            return Err("export.shutdown_timeout_secs must be > 0".to_string());
        }

        Ok(())
    }

    /// Acquire deadline for the concurrency semaphore
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Wall-clock budget for an operation over `file_count` unique files
    pub fn operation_timeout(&self, file_count: usize) -> Duration {
        Duration::from_secs(self.timeout_base_secs)
            + Duration::from_millis(self.timeout_per_file_ms.saturating_mul(file_count as u64))
    }
}

/// Archive builder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Upper bound for the uncompressed payload of one archive
    #[serde(default = "default_max_archive_size_mb")]
    pub max_archive_size_mb: u64,

    /// Upper bound for the number of entries in one archive
    #[serde(default = "default_max_file_count")]
    pub max_file_count: usize,

    /// Payload limit per volume, 0 writes a single volume
    #[serde(default)]
    pub volume_size_mb: u64,

    /// Compression level used by the CLI when none is given (0-9)
    #[serde(default = "default_compression_level")]
    pub default_compression_level: u8,

    /// Re-read every written volume and check entry sizes and CRCs
    #[serde(default)]
    pub verify_archives: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_archive_size_mb: default_max_archive_size_mb(),
            max_file_count: default_max_file_count(),
            volume_size_mb: 0,
            default_compression_level: default_compression_level(),
            verify_archives: false,
        }
    }
}

impl ArchiveConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_archive_size_mb == 0 {
            return Err("archive.max_archive_size_mb must be > 0".to_string());
        }

        if self.max_file_count == 0 {
            return Err("archive.max_file_count must be > 0".to_string());
        }

        if self.default_compression_level > 9 {
            return Err("archive.default_compression_level must be between 0 and 9".to_string());
        }

        if self.volume_size_mb > self.max_archive_size_mb {
            return Err(format!(
                "archive.volume_size_mb ({}) cannot exceed archive.max_archive_size_mb ({})",
                self.volume_size_mb, self.max_archive_size_mb
            ));
        }

        Ok(())
    }

    pub fn max_archive_bytes(&self) -> u64 {
        self.max_archive_size_mb.saturating_mul(1024 * 1024)
    }

    /// Payload limit per volume in bytes, `None` for a single volume
    pub fn volume_bytes(&self) -> Option<u64> {
        (self.volume_size_mb > 0).then(|| self.volume_size_mb.saturating_mul(1024 * 1024))
    }
}

/// Download token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadsConfig {
    /// Lifetime of a download token and retention of finished operations
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Interval between cleanup sweeps, 0 disables the background sweeper
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl DownloadsConfig {
    fn validate(&self) -> Result<(), String> {
        if self.token_ttl_secs == 0 {
            return Err("downloads.token_ttl_secs must be > 0".to_string());
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// Sweep interval, `None` when the sweeper is disabled
    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval_secs > 0).then(|| Duration::from_secs(self.cleanup_interval_secs))
    }
}

/// Local artifact store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory file ids are resolved against
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
        }
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.source_dir.as_os_str().is_empty() {
            return Err("storage.source_dir cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("./exports")
}

fn default_max_batch_size() -> usize {
    50
}

fn default_max_concurrent_exports() -> usize {
    3
}

fn default_acquire_timeout_ms() -> u64 {
    500
}

fn default_file_workers() -> usize {
    4
}

fn default_timeout_base_secs() -> u64 {
    60
}

fn default_timeout_per_file_ms() -> u64 {
    30_000
}

fn default_quality() -> u8 {
    95
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_max_archive_size_mb() -> u64 {
    1000
}

fn default_max_file_count() -> usize {
    1000
}

fn default_compression_level() -> u8 {
    6
}

fn default_token_ttl_secs() -> u64 {
    86_400
}

fn default_cleanup_interval_secs() -> u64 {
    3600
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("./storage")
}

fn default_local_path() -> String {
    "/var/log/courier".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CourierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.export.max_batch_size, 50);
        assert_eq!(config.export.max_concurrent_exports, 3);
        assert_eq!(config.archive.default_compression_level, 6);
        assert_eq!(config.downloads.token_ttl_secs, 86_400);
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
        };
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_config_validation() {
        let mut config = ExportConfig::default();
        assert!(config.validate().is_ok());

        config.max_concurrent_exports = 0;
        assert!(config.validate().is_err());

        config.max_concurrent_exports = 3;
        config.max_batch_size = 0;
        assert!(config.validate().is_err());

        config.max_batch_size = 10;
        config.default_quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_operation_timeout_scales_with_files() {
        let config = ExportConfig {
            timeout_base_secs: 10,
            timeout_per_file_ms: 500,
            ..ExportConfig::default()
        };
        assert_eq!(config.operation_timeout(0), Duration::from_secs(10));
        assert_eq!(config.operation_timeout(4), Duration::from_secs(12));
    }

    #[test]
    fn test_archive_config_validation() {
        let mut config = ArchiveConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.volume_bytes(), None);

        config.volume_size_mb = 2000;
        assert!(config.validate().is_err());

        config.volume_size_mb = 10;
        assert_eq!(config.volume_bytes(), Some(10 * 1024 * 1024));

        config.default_compression_level = 12;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cleanup_interval_zero_disables() {
        let config = DownloadsConfig {
            token_ttl_secs: 60,
            cleanup_interval_secs: 0,
        };
        assert!(config.validate().is_ok());
        assert!(config.cleanup_interval().is_none());
    }

    #[test]
    fn test_logging_rotation_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.local_rotation = "size".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: CourierConfig = toml::from_str("").unwrap();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.export.export_dir, PathBuf::from("./exports"));
        assert_eq!(config.storage.source_dir, PathBuf::from("./storage"));
    }
}
