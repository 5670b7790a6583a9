//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Courier configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates every section after parsing
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Export Directory: {}", config.export.export_dir.display());
        println!("  Source Directory: {}", config.storage.source_dir.display());
        println!("  Max Batch Size: {}", config.export.max_batch_size);
        println!(
            "  Concurrent Exports: {} (acquire timeout {} ms)",
            config.export.max_concurrent_exports, config.export.acquire_timeout_ms
        );
        println!("  File Workers: {}", config.export.file_workers);
        println!(
            "  Operation Budget: {}s + {} ms per file",
            config.export.timeout_base_secs, config.export.timeout_per_file_ms
        );
        println!(
            "  Archive Limits: {} MB, {} files",
            config.archive.max_archive_size_mb, config.archive.max_file_count
        );
        match config.archive.volume_bytes() {
            Some(_) => println!("  Volume Size: {} MB", config.archive.volume_size_mb),
            None => println!("  Volume Size: single volume"),
        }
        println!("  Verify Archives: {}", config.archive.verify_archives);
        println!("  Token TTL: {}s", config.downloads.token_ttl_secs);
        match config.downloads.cleanup_interval() {
            Some(interval) => println!("  Cleanup Interval: {}s", interval.as_secs()),
            None => println!("  Cleanup Interval: disabled"),
        }
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_valid_config_exits_zero() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[export]\nmax_batch_size = 10").unwrap();
        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_invalid_config_exits_two() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[export]\nmax_batch_size = 0").unwrap();
        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_missing_file_exits_two() {
        let code = ValidateArgs {}
            .execute("/nonexistent/courier.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
