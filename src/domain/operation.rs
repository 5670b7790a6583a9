//! Export operation model and its state machine
//!
//! Statuses only move forward: `Pending -> Preparing -> {Exporting | Packaging}
//! -> {Completed | Failed}`, or from any non-terminal status to `Cancelled`.
//! Which working statuses an operation may enter depends on its [`ExportKind`].

use crate::domain::errors::ExportError;
use crate::domain::ids::{FileId, OperationId};
use crate::domain::options::ExportOptions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Kind of export requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    /// One file converted to the requested format
    SingleFile,
    /// Many files converted into one output directory
    BatchFiles,
    /// Files packed into a structured ZIP archive
    ZipArchive,
    /// Files rendered into an HTML gallery, optionally bundled
    HtmlPortfolio,
}

impl ExportKind {
    pub const ALL: [ExportKind; 4] = [
        ExportKind::SingleFile,
        ExportKind::BatchFiles,
        ExportKind::ZipArchive,
        ExportKind::HtmlPortfolio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::SingleFile => "single_file",
            ExportKind::BatchFiles => "batch_files",
            ExportKind::ZipArchive => "zip_archive",
            ExportKind::HtmlPortfolio => "html_portfolio",
        }
    }

    /// Prefix of the operation's output directory
    pub fn dir_prefix(&self) -> &'static str {
        match self {
            ExportKind::SingleFile => "single",
            ExportKind::BatchFiles => "batch",
            ExportKind::ZipArchive => "zip",
            ExportKind::HtmlPortfolio => "portfolio",
        }
    }

    /// Whether the operation must hold a concurrency slot while it runs
    pub fn is_heavy(&self) -> bool {
        !matches!(self, ExportKind::SingleFile)
    }

    /// Working statuses this kind passes through, in order
    pub fn working_statuses(&self) -> &'static [ExportStatus] {
        match self {
            ExportKind::SingleFile | ExportKind::BatchFiles => &[ExportStatus::Exporting],
            ExportKind::ZipArchive => &[ExportStatus::Packaging],
            ExportKind::HtmlPortfolio => &[ExportStatus::Exporting, ExportStatus::Packaging],
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "single_file" => Ok(ExportKind::SingleFile),
            "batch" | "batch_files" => Ok(ExportKind::BatchFiles),
            "zip" | "zip_archive" => Ok(ExportKind::ZipArchive),
            "portfolio" | "html_portfolio" => Ok(ExportKind::HtmlPortfolio),
            other => Err(format!("unknown export kind: {other}")),
        }
    }
}

/// Lifecycle status of an export operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Pending,
    Preparing,
    Exporting,
    Packaging,
    Completed,
    Failed,
    Cancelled,
}

impl ExportStatus {
    pub const ALL: [ExportStatus; 7] = [
        ExportStatus::Pending,
        ExportStatus::Preparing,
        ExportStatus::Exporting,
        ExportStatus::Packaging,
        ExportStatus::Completed,
        ExportStatus::Failed,
        ExportStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStatus::Pending => "pending",
            ExportStatus::Preparing => "preparing",
            ExportStatus::Exporting => "exporting",
            ExportStatus::Packaging => "packaging",
            ExportStatus::Completed => "completed",
            ExportStatus::Failed => "failed",
            ExportStatus::Cancelled => "cancelled",
        }
    }

    /// Completed, failed and cancelled operations never change status again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExportStatus::Completed | ExportStatus::Failed | ExportStatus::Cancelled
        )
    }

    /// Whether `self -> next` is a legal move for an operation of `kind`
    pub fn can_transition_to(&self, next: ExportStatus, kind: ExportKind) -> bool {
        use ExportStatus::*;

        if self.is_terminal() {
            return false;
        }

        match next {
            Pending => false,
            Preparing => *self == Pending,
            Exporting | Packaging => {
                if !kind.working_statuses().contains(&next) {
                    return false;
                }
                match self {
                    Preparing => true,
                    Exporting => next == Packaging,
                    _ => false,
                }
            }
            Completed => matches!(self, Exporting | Packaging),
            Failed | Cancelled => true,
        }
    }
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportStatus::ALL
            .iter()
            .find(|status| status.as_str() == s.to_lowercase())
            .copied()
            .ok_or_else(|| format!("unknown export status: {s}"))
    }
}

/// One tracked export request
///
/// Snapshots handed out by the registry are clones; the registry owns the
/// live record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOperation {
    pub id: OperationId,
    pub kind: ExportKind,
    pub status: ExportStatus,

    /// Every status the operation has held, oldest first
    pub status_history: Vec<ExportStatus>,

    /// Fraction of unique input files processed, 0.0 to 1.0
    pub progress: f64,

    /// Input ids as submitted (may contain duplicates)
    pub file_ids: Vec<FileId>,
    pub total_files: usize,
    pub processed_files: usize,

    /// Unique ids that did not make it into the artifact
    pub unresolved_file_ids: Vec<FileId>,

    /// Artifact location, set once the operation completes
    pub output_path: Option<PathBuf>,

    /// Directory owned by this operation, removed by the cleanup sweep
    pub work_dir: Option<PathBuf>,
    pub download_token: Option<String>,
    pub expiry_time: Option<DateTime<Utc>>,

    pub errors: Vec<ExportError>,
    pub warnings: Vec<String>,

    pub options: ExportOptions,

    /// Result details (archive size, compression ratio, verification report, ...)
    pub metadata: BTreeMap<String, serde_json::Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExportOperation {
    /// Creates a new `Pending` operation with a fresh id
    pub fn new(kind: ExportKind, file_ids: Vec<FileId>, options: ExportOptions) -> Self {
        let now = Utc::now();
        let total_files = unique_in_order(&file_ids).len();
        Self {
            id: OperationId::generate(),
            kind,
            status: ExportStatus::Pending,
            status_history: vec![ExportStatus::Pending],
            progress: 0.0,
            file_ids,
            total_files,
            processed_files: 0,
            unresolved_file_ids: Vec::new(),
            output_path: None,
            work_dir: None,
            download_token: None,
            expiry_time: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            options,
            metadata: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    /// Input ids deduplicated, keeping the first occurrence order
    pub fn unique_file_ids(&self) -> Vec<FileId> {
        unique_in_order(&self.file_ids)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the operation finished with a usable artifact
    pub fn is_success(&self) -> bool {
        self.status == ExportStatus::Completed
    }

    /// Time from creation to reaching a terminal status
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.created_at)
    }

    /// Whether this terminal operation is past its retention time
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_terminal() && self.expiry_time.is_some_and(|expiry| now > expiry)
    }
}

fn unique_in_order(ids: &[FileId]) -> Vec<FileId> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str().to_string()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn ids(raw: &[&str]) -> Vec<FileId> {
        raw.iter().map(|s| FileId::new(*s).unwrap()).collect()
    }

    #[test]
    fn test_new_operation_is_pending() {
        let op = ExportOperation::new(ExportKind::BatchFiles, ids(&["a", "b"]), ExportOptions::default());
        assert_eq!(op.status, ExportStatus::Pending);
        assert_eq!(op.status_history, vec![ExportStatus::Pending]);
        assert_eq!(op.total_files, 2);
        assert_eq!(op.progress, 0.0);
        assert!(op.output_path.is_none());
    }

    #[test]
    fn test_duplicates_deduplicated_for_processing() {
        let op = ExportOperation::new(
            ExportKind::ZipArchive,
            ids(&["b", "a", "b", "c", "a"]),
            ExportOptions::default(),
        );
        assert_eq!(op.file_ids.len(), 5);
        assert_eq!(op.total_files, 3);
        let unique: Vec<_> = op.unique_file_ids().iter().map(|id| id.to_string()).collect();
        assert_eq!(unique, vec!["b", "a", "c"]);
    }

    #[test_case(ExportKind::BatchFiles, ExportStatus::Exporting, true)]
    #[test_case(ExportKind::BatchFiles, ExportStatus::Packaging, false)]
    #[test_case(ExportKind::ZipArchive, ExportStatus::Packaging, true)]
    #[test_case(ExportKind::ZipArchive, ExportStatus::Exporting, false)]
    #[test_case(ExportKind::HtmlPortfolio, ExportStatus::Exporting, true)]
    fn test_working_status_by_kind(kind: ExportKind, next: ExportStatus, allowed: bool) {
        assert_eq!(
            ExportStatus::Preparing.can_transition_to(next, kind),
            allowed
        );
    }

    #[test]
    fn test_completed_requires_working_status() {
        let kind = ExportKind::SingleFile;
        assert!(!ExportStatus::Pending.can_transition_to(ExportStatus::Completed, kind));
        assert!(!ExportStatus::Preparing.can_transition_to(ExportStatus::Completed, kind));
        assert!(ExportStatus::Exporting.can_transition_to(ExportStatus::Completed, kind));
    }

    #[test]
    fn test_portfolio_moves_from_exporting_to_packaging() {
        let kind = ExportKind::HtmlPortfolio;
        assert!(ExportStatus::Exporting.can_transition_to(ExportStatus::Packaging, kind));
        assert!(!ExportStatus::Packaging.can_transition_to(ExportStatus::Exporting, kind));
    }

    #[test]
    fn test_terminal_statuses_are_final() {
        for terminal in [ExportStatus::Completed, ExportStatus::Failed, ExportStatus::Cancelled] {
            for next in ExportStatus::ALL {
                assert!(!terminal.can_transition_to(next, ExportKind::BatchFiles));
            }
        }
    }

    #[test]
    fn test_no_status_can_go_back_to_pending() {
        for status in ExportStatus::ALL {
            assert!(!status.can_transition_to(ExportStatus::Pending, ExportKind::ZipArchive));
        }
    }

    #[test]
    fn test_cancel_and_fail_from_any_non_terminal() {
        for status in [
            ExportStatus::Pending,
            ExportStatus::Preparing,
            ExportStatus::Exporting,
            ExportStatus::Packaging,
        ] {
            assert!(status.can_transition_to(ExportStatus::Cancelled, ExportKind::HtmlPortfolio));
            assert!(status.can_transition_to(ExportStatus::Failed, ExportKind::HtmlPortfolio));
        }
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("zip".parse::<ExportKind>().unwrap(), ExportKind::ZipArchive);
        assert_eq!("html_portfolio".parse::<ExportKind>().unwrap(), ExportKind::HtmlPortfolio);
        assert!("pdf".parse::<ExportKind>().is_err());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ExportStatus::Packaging).unwrap();
        assert_eq!(json, "\"packaging\"");
        assert_eq!("cancelled".parse::<ExportStatus>().unwrap(), ExportStatus::Cancelled);
    }

    #[test]
    fn test_is_expired_only_when_terminal() {
        let mut op = ExportOperation::new(ExportKind::SingleFile, ids(&["a"]), ExportOptions::default());
        let past = Utc::now() - chrono::Duration::seconds(5);
        op.expiry_time = Some(past);
        assert!(!op.is_expired(Utc::now()));
        op.status = ExportStatus::Failed;
        assert!(op.is_expired(Utc::now()));
    }
}
