//! Export statistics and reporting
//!
//! This module aggregates the operation registry into the figures reported by
//! `get_statistics` and prints operation summaries for the CLI.

use crate::domain::operation::{ExportKind, ExportOperation, ExportStatus};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate view over every operation in the registry
#[derive(Debug, Clone, Serialize)]
pub struct ExportStatistics {
    /// Number of operations currently tracked
    pub total_operations: usize,

    /// Operations not yet in a terminal status
    pub active_operations: usize,

    /// Count per status, every status listed
    pub by_status: BTreeMap<String, usize>,

    /// Count per kind, every kind listed
    pub by_kind: BTreeMap<String, usize>,

    /// `completed / (completed + failed)`, 0.0 when neither occurred
    pub success_rate: f64,

    /// Files written by completed operations
    pub total_files_exported: usize,

    /// Mean requested file count of batch operations
    pub average_batch_size: f64,

    /// Operations created in the last 24 hours
    pub recent_operations: usize,
}

impl ExportStatistics {
    /// Builds statistics from a registry snapshot
    pub fn from_operations(operations: &[ExportOperation], now: DateTime<Utc>) -> Self {
        let mut by_status: BTreeMap<String, usize> = ExportStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        let mut by_kind: BTreeMap<String, usize> = ExportKind::ALL
            .iter()
            .map(|k| (k.as_str().to_string(), 0))
            .collect();

        for operation in operations {
            *by_status.entry(operation.status.as_str().to_string()).or_insert(0) += 1;
            *by_kind.entry(operation.kind.as_str().to_string()).or_insert(0) += 1;
        }

        let completed = by_status[ExportStatus::Completed.as_str()];
        let failed = by_status[ExportStatus::Failed.as_str()];
        let success_rate = if completed + failed == 0 {
            0.0
        } else {
            completed as f64 / (completed + failed) as f64
        };

        let batch_sizes: Vec<usize> = operations
            .iter()
            .filter(|op| op.kind == ExportKind::BatchFiles)
            .map(|op| op.total_files)
            .collect();
        let average_batch_size = if batch_sizes.is_empty() {
            0.0
        } else {
            batch_sizes.iter().sum::<usize>() as f64 / batch_sizes.len() as f64
        };

        let day_ago = now - Duration::hours(24);

        Self {
            total_operations: operations.len(),
            active_operations: operations.iter().filter(|op| !op.is_terminal()).count(),
            by_status,
            by_kind,
            success_rate,
            total_files_exported: operations
                .iter()
                .filter(|op| op.is_success())
                .map(|op| op.processed_files)
                .sum(),
            average_batch_size,
            recent_operations: operations
                .iter()
                .filter(|op| op.created_at > day_ago)
                .count(),
        }
    }

    /// Format the statistics as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("Export statistics\n");
        summary.push_str(&format!("  Operations: {}\n", self.total_operations));
        summary.push_str(&format!("  Active: {}\n", self.active_operations));
        summary.push_str(&format!("  Success rate: {:.1}%\n", self.success_rate * 100.0));
        summary.push_str(&format!("  Files exported: {}\n", self.total_files_exported));
        for (status, count) in self.by_status.iter().filter(|(_, c)| **c > 0) {
            summary.push_str(&format!("  {status}: {count}\n"));
        }
        summary
    }
}

/// Format one operation as a human-readable report
pub fn format_operation(operation: &ExportOperation) -> String {
    let mut summary = String::new();
    summary.push_str(&format!("Operation {}\n", operation.id));
    summary.push_str(&format!("  Kind: {}\n", operation.kind));
    summary.push_str(&format!("  Status: {}\n", operation.status));
    summary.push_str(&format!(
        "  Files: {}/{} ({:.0}%)\n",
        operation.processed_files,
        operation.total_files,
        operation.progress * 100.0
    ));
    if let Some(duration) = operation.duration() {
        summary.push_str(&format!("  Duration: {} ms\n", duration.num_milliseconds()));
    }
    if let Some(path) = &operation.output_path {
        summary.push_str(&format!("  Artifact: {}\n", path.display()));
    }
    if let Some(token) = &operation.download_token {
        summary.push_str(&format!("  Download token: {token}\n"));
    }
    if let Some(expiry) = &operation.expiry_time {
        summary.push_str(&format!("  Expires: {expiry}\n"));
    }
    if let Some(ratio) = operation.metadata.get("compression_ratio").and_then(|r| r.as_f64()) {
        summary.push_str(&format!("  Compression ratio: {ratio:.3}\n"));
    }

    if !operation.warnings.is_empty() {
        summary.push_str(&format!("\nWarnings ({}):\n", operation.warnings.len()));
        for warning in &operation.warnings {
            summary.push_str(&format!("  - {warning}\n"));
        }
    }
    if !operation.errors.is_empty() {
        summary.push_str(&format!("\nErrors ({}):\n", operation.errors.len()));
        for error in &operation.errors {
            summary.push_str(&format!("  - {error}\n"));
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::FileId;
    use crate::domain::options::ExportOptions;

    fn operation(kind: ExportKind, status: ExportStatus, files: usize) -> ExportOperation {
        let ids = (0..files).map(|i| FileId::new(format!("f{i}")).unwrap()).collect();
        let mut op = ExportOperation::new(kind, ids, ExportOptions::default());
        op.status = status;
        op.processed_files = files;
        op
    }

    #[test]
    fn test_empty_registry() {
        let stats = ExportStatistics::from_operations(&[], Utc::now());
        assert_eq!(stats.total_operations, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.by_status.len(), ExportStatus::ALL.len());
        assert_eq!(stats.by_kind["zip_archive"], 0);
    }

    #[test]
    fn test_rates_and_counts() {
        let ops = vec![
            operation(ExportKind::BatchFiles, ExportStatus::Completed, 4),
            operation(ExportKind::BatchFiles, ExportStatus::Failed, 2),
            operation(ExportKind::ZipArchive, ExportStatus::Completed, 3),
            operation(ExportKind::SingleFile, ExportStatus::Exporting, 1),
            operation(ExportKind::ZipArchive, ExportStatus::Cancelled, 5),
        ];
        let stats = ExportStatistics::from_operations(&ops, Utc::now());

        assert_eq!(stats.total_operations, 5);
        assert_eq!(stats.active_operations, 1);
        assert!((stats.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.total_files_exported, 7);
        assert_eq!(stats.average_batch_size, 3.0);
        assert_eq!(stats.recent_operations, 5);
        assert_eq!(stats.by_kind["batch_files"], 2);
        assert_eq!(stats.by_status["cancelled"], 1);
    }

    #[test]
    fn test_format_operation() {
        let mut op = operation(ExportKind::ZipArchive, ExportStatus::Completed, 2);
        op.warnings.push("file not found: x".to_string());
        let text = format_operation(&op);
        assert!(text.contains("Files: 2/2"));
        assert!(text.contains("- file not found: x"));
    }
}
