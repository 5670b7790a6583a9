//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::CourierConfig;
use crate::domain::errors::CourierError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into CourierConfig
/// 4. Applies environment variable overrides (COURIER_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - An override variable cannot be parsed
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use courier::config::loader::load_config;
///
/// let config = load_config("courier.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<CourierConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CourierError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CourierError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Same as [`load_config`] for in-memory TOML
pub fn load_config_from_str(contents: &str) -> Result<CourierConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: CourierConfig = toml::from_str(&contents)
        .map_err(|e| CourierError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        CourierError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched. All missing variables are reported
/// together.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| CourierError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(CourierError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Reads and parses an override variable, `None` when unset
fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            CourierError::Configuration(format!("Invalid value for {name}: '{val}'"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using COURIER_* prefix
///
/// Environment variables follow the pattern: COURIER_<SECTION>_<KEY>
/// For example: COURIER_EXPORT_MAX_BATCH_SIZE, COURIER_DOWNLOADS_TOKEN_TTL_SECS
fn apply_env_overrides(config: &mut CourierConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env_parse("COURIER_APPLICATION_LOG_LEVEL")? {
        config.application.log_level = val;
    }

    // Export overrides
    if let Some(val) = env_parse("COURIER_EXPORT_EXPORT_DIR")? {
        config.export.export_dir = val;
    }
    if let Some(val) = env_parse("COURIER_EXPORT_MAX_BATCH_SIZE")? {
        config.export.max_batch_size = val;
    }
    if let Some(val) = env_parse("COURIER_EXPORT_MAX_CONCURRENT_EXPORTS")? {
        config.export.max_concurrent_exports = val;
    }
    if let Some(val) = env_parse("COURIER_EXPORT_ACQUIRE_TIMEOUT_MS")? {
        config.export.acquire_timeout_ms = val;
    }
    if let Some(val) = env_parse("COURIER_EXPORT_FILE_WORKERS")? {
        config.export.file_workers = val;
    }
    if let Some(val) = env_parse("COURIER_EXPORT_TIMEOUT_BASE_SECS")? {
        config.export.timeout_base_secs = val;
    }
    if let Some(val) = env_parse("COURIER_EXPORT_TIMEOUT_PER_FILE_MS")? {
        config.export.timeout_per_file_ms = val;
    }
    if let Some(val) = env_parse("COURIER_EXPORT_DEFAULT_QUALITY")? {
        config.export.default_quality = val;
    }
    if let Some(val) = env_parse("COURIER_EXPORT_SHUTDOWN_TIMEOUT_SECS")? {
        config.export.shutdown_timeout_secs = val;
    }

    // Archive overrides
    if let Some(val) = env_parse("COURIER_ARCHIVE_MAX_ARCHIVE_SIZE_MB")? {
        config.archive.max_archive_size_mb = val;
    }
    if let Some(val) = env_parse("COURIER_ARCHIVE_MAX_FILE_COUNT")? {
        config.archive.max_file_count = val;
    }
    if let Some(val) = env_parse("COURIER_ARCHIVE_VOLUME_SIZE_MB")? {
        config.archive.volume_size_mb = val;
    }
    if let Some(val) = env_parse("COURIER_ARCHIVE_DEFAULT_COMPRESSION_LEVEL")? {
        config.archive.default_compression_level = val;
    }
    if let Some(val) = env_parse("COURIER_ARCHIVE_VERIFY_ARCHIVES")? {
        config.archive.verify_archives = val;
    }

    // Download overrides
    if let Some(val) = env_parse("COURIER_DOWNLOADS_TOKEN_TTL_SECS")? {
        config.downloads.token_ttl_secs = val;
    }
    if let Some(val) = env_parse("COURIER_DOWNLOADS_CLEANUP_INTERVAL_SECS")? {
        config.downloads.cleanup_interval_secs = val;
    }

    // Storage overrides
    if let Some(val) = env_parse("COURIER_STORAGE_SOURCE_DIR")? {
        config.storage.source_dir = val;
    }

    // Logging overrides
    if let Some(val) = env_parse("COURIER_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Some(val) = env_parse("COURIER_LOGGING_LOCAL_PATH")? {
        config.logging.local_path = val;
    }
    if let Some(val) = env_parse("COURIER_LOGGING_LOCAL_ROTATION")? {
        config.logging.local_rotation = val;
    }

    Ok(())
}
