//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "courier.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Courier configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Point storage.source_dir at the files you want to export");
                println!("  2. Edit {} with your limits", self.output);
                println!("  3. Validate configuration: courier validate-config");
                println!("  4. Run an export: courier export --kind zip --files a.png,b.png");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(3)
            }
        }
    }

    /// Documented configuration with every default spelled out
    fn sample_config() -> String {
        r#"# Courier Configuration File
#
# Every value below is the default. Values can reference environment
# variables with ${VAR_NAME} and be overridden with COURIER_<SECTION>_<KEY>,
# e.g. COURIER_EXPORT_MAX_BATCH_SIZE=100.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Export Scheduling
# ============================================================================
[export]
# Root directory; every operation writes into <kind>_<operation_id>/ below it
export_dir = "./exports"

# Maximum number of file ids in one request
max_batch_size = 50

# Batch, archive and portfolio exports allowed to run at once (1-64)
max_concurrent_exports = 3

# How long a heavy export waits for a free slot before failing
acquire_timeout_ms = 500

# Per-operation worker pool for resolving and transforming files (1-64)
file_workers = 4

# Operation time budget: timeout_base_secs + timeout_per_file_ms x files
timeout_base_secs = 60
timeout_per_file_ms = 30000

# Quality used when the request does not set one (1-100)
default_quality = 95

# Time the CLI waits for running exports after Ctrl+C
shutdown_timeout_secs = 30

# ============================================================================
# Archives
# ============================================================================
[archive]
# Limits checked before anything is written
max_archive_size_mb = 1000
max_file_count = 1000

# Split archives into volumes of this payload size (0 = single archive)
volume_size_mb = 0

# Compression level used when the request does not set one (0-9)
default_compression_level = 6

# Re-read written archives and check sizes and CRCs
verify_archives = false

# ============================================================================
# Download Tokens
# ============================================================================
[downloads]
# Token lifetime; finished operations are kept for the same time
token_ttl_secs = 86400

# Cleanup sweep interval (0 disables the background sweeper)
cleanup_interval_secs = 3600

# ============================================================================
# Local Storage
# ============================================================================
[storage]
# File ids are resolved as relative paths below this directory
source_dir = "./storage"

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON file logging in addition to the console
local_enabled = false
local_path = "/var/log/courier"

# Log rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use tempfile::TempDir;

    #[test]
    fn test_sample_config_is_valid() {
        let config = load_config_from_str(&InitArgs::sample_config()).unwrap();
        assert_eq!(config.export.max_batch_size, 50);
        assert_eq!(config.downloads.cleanup_interval_secs, 3600);
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("courier.toml");
        fs::write(&output, "# existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "# existing");

        let forced = InitArgs {
            force: true,
            ..args
        };
        assert_eq!(forced.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&output).unwrap().contains("[export]"));
    }
}
