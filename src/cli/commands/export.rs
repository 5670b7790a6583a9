//! Export command implementation
//!
//! This module implements the `export` command, which runs one export against
//! the local artifact store and prints the resulting operation.

use crate::adapters::create_local_collaborators;
use crate::config::{load_config, CourierConfig};
use crate::core::export::{format_operation, ExportOrchestrator};
use crate::domain::ids::parse_file_ids;
use crate::domain::{
    CompressionMethod, ExportErrorType, ExportKind, ExportOperation, ExportOptions, ExportStatus,
    OutputFormat, StructureMode,
};
use clap::Args;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export kind (single, batch, zip or portfolio)
    #[arg(short, long)]
    pub kind: ExportKind,

    /// File ids to export (comma-separated, relative to storage.source_dir)
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub files: Vec<String>,

    /// Archive layout (flat, organized, by_date, by_type)
    #[arg(long)]
    pub structure: Option<StructureMode>,

    /// Compression method (stored, deflated, bzip2)
    #[arg(long)]
    pub compression: Option<CompressionMethod>,

    /// Compression level (0-9)
    #[arg(long)]
    pub level: Option<u8>,

    /// Archive name without extension
    #[arg(long)]
    pub archive_name: Option<String>,

    /// Output format for converted files
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Output quality (1-100)
    #[arg(long)]
    pub quality: Option<u8>,

    /// Portfolio title
    #[arg(long)]
    pub title: Option<String>,

    /// Skip manifest, README and CSV index in archives
    #[arg(long)]
    pub no_metadata: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(kind = %self.kind, files = self.files.len(), "Starting export command");

        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let options = self.build_options(&config);
        if let Err(e) = options.validate() {
            eprintln!("Invalid export options: {e}");
            return Ok(2);
        }

        let collaborators = create_local_collaborators(&config.storage);
        let orchestrator = match ExportOrchestrator::new(config, collaborators).await {
            Ok(orchestrator) => orchestrator,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create export orchestrator");
                eprintln!("Failed to initialize export: {e}");
                return Ok(2);
            }
        };

        println!("🚀 Starting {} export of {} file(s)...", self.kind, self.files.len());
        let id = orchestrator.submit_export_with_progress(
            self.kind,
            parse_file_ids(&self.files),
            options,
            |progress| println!("  Progress: {:>3.0}%", progress * 100.0),
        );

        let operation = tokio::select! {
            operation = orchestrator.wait_for_completion(&id) => operation,
            Ok(_) = shutdown_signal.wait_for(|stop| *stop) => {
                println!("\n⚠️  Shutdown signal received, cancelling export...");
                orchestrator.cancel_operation(&id);
                orchestrator.wait_for_completion(&id).await
            }
        };
        orchestrator.shutdown().await;

        let Some(operation) = operation else {
            eprintln!("Operation {id} disappeared before it finished");
            return Ok(3);
        };

        println!();
        println!("📊 Export Summary:");
        print!("{}", format_operation(&operation));
        println!();

        let exit_code = exit_code_for(&operation);
        match exit_code {
            0 => println!("✅ Export completed successfully!"),
            1 => println!("⚠️  Export completed with warnings"),
            130 => println!("⚠️  Export cancelled"),
            _ => println!("❌ Export failed"),
        }
        Ok(exit_code)
    }

    /// Request options from the flags, falling back to configured defaults
    fn build_options(&self, config: &CourierConfig) -> ExportOptions {
        let mut options = ExportOptions::default()
            .with_quality(self.quality.unwrap_or(config.export.default_quality))
            .with_compression(
                self.compression.unwrap_or(CompressionMethod::Deflated),
                self.level.unwrap_or(config.archive.default_compression_level),
            );

        if let Some(structure) = self.structure {
            options = options.with_structure(structure);
        }
        if let Some(format) = self.format {
            options = options.with_format(format);
        }
        if let Some(name) = &self.archive_name {
            options = options.with_archive_name(name.clone());
        }
        if let Some(title) = &self.title {
            options.portfolio.title = title.clone();
        }
        if self.no_metadata {
            options = options.without_metadata();
        }
        options
    }
}

/// Process exit code for a finished operation
///
/// 0 success, 1 completed with warnings, 2 rejected request, 3 failed,
/// 130 cancelled.
pub fn exit_code_for(operation: &ExportOperation) -> i32 {
    match operation.status {
        ExportStatus::Completed if operation.warnings.is_empty() => 0,
        ExportStatus::Completed => 1,
        ExportStatus::Cancelled => 130,
        ExportStatus::Failed
            if operation
                .errors
                .iter()
                .any(|e| e.error_type == ExportErrorType::Validation) =>
        {
            2
        }
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExportError, FileId};

    fn args() -> ExportArgs {
        ExportArgs {
            kind: ExportKind::ZipArchive,
            files: vec!["a.png".to_string()],
            structure: None,
            compression: None,
            level: None,
            archive_name: None,
            format: None,
            quality: None,
            title: None,
            no_metadata: false,
        }
    }

    fn operation(status: ExportStatus) -> ExportOperation {
        let mut op = ExportOperation::new(
            ExportKind::BatchFiles,
            vec![FileId::new("a").unwrap()],
            ExportOptions::default(),
        );
        op.status = status;
        op
    }

    #[test]
    fn test_options_use_config_defaults() {
        let mut config = CourierConfig::default();
        config.export.default_quality = 80;
        config.archive.default_compression_level = 3;

        let options = args().build_options(&config);
        assert_eq!(options.quality, 80);
        assert_eq!(options.compression.level, 3);
        assert_eq!(options.compression.method, CompressionMethod::Deflated);
        assert!(options.include_metadata);
    }

    #[test]
    fn test_options_flags_override() {
        let mut args = args();
        args.structure = Some(StructureMode::Flat);
        args.compression = Some(CompressionMethod::Stored);
        args.level = Some(0);
        args.no_metadata = true;
        args.title = Some("Spring".to_string());

        let options = args.build_options(&CourierConfig::default());
        assert_eq!(options.structure, StructureMode::Flat);
        assert_eq!(options.compression.method, CompressionMethod::Stored);
        assert!(!options.include_metadata);
        assert_eq!(options.portfolio.title, "Spring");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&operation(ExportStatus::Completed)), 0);

        let mut warned = operation(ExportStatus::Completed);
        warned.warnings.push("file not found: b".to_string());
        assert_eq!(exit_code_for(&warned), 1);

        assert_eq!(exit_code_for(&operation(ExportStatus::Cancelled)), 130);

        let mut rejected = operation(ExportStatus::Failed);
        rejected
            .errors
            .push(ExportError::new(ExportErrorType::Validation, "no files provided"));
        assert_eq!(exit_code_for(&rejected), 2);

        let mut failed = operation(ExportStatus::Failed);
        failed
            .errors
            .push(ExportError::new(ExportErrorType::NotFound, "no valid files found"));
        assert_eq!(exit_code_for(&failed), 3);
    }
}
