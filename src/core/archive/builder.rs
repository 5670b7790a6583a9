//! Archive writer
//!
//! Writes an [`ArchivePlacementPlan`] into one or more zip volumes. The build
//! is synchronous and meant to run on a blocking thread; it checks the
//! cancellation token before every entry.

use crate::core::archive::manifest::{
    build_csv_index, build_manifest, build_readme, ArchiveDescription, MetadataFiles,
    CSV_INDEX_FILE, MANIFEST_FILE, README_FILE,
};
use crate::core::archive::plan::{ArchivePlacementPlan, PlacementEntry};
use crate::core::verification::{verify_archive, ExpectedEntry, VerificationReport};
use crate::domain::context::ResultExt;
use crate::domain::errors::CourierError;
use crate::domain::ids::FileId;
use crate::domain::options::{CompressionMethod, CompressionSettings, StructureMode};
use crate::domain::result::Result;
use chrono::Utc;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const MB: u64 = 1024 * 1024;

/// What to build and where
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    /// Archive name without the `.zip` extension
    pub name: String,
    pub output_dir: PathBuf,
    pub structure: StructureMode,
    pub compression: CompressionSettings,
    pub metadata_files: MetadataFiles,
}

/// Hard limits checked against the whole plan before writing
#[derive(Debug, Clone, Copy)]
pub struct ArchiveLimits {
    pub max_file_count: usize,
    pub max_total_bytes: u64,

    /// Maximum payload per volume, `None` for a single volume
    pub volume_bytes: Option<u64>,

    /// Read every volume back after writing
    pub verify: bool,
}

impl ArchiveLimits {
    /// No limits, single volume, no verification
    pub fn unbounded() -> Self {
        Self {
            max_file_count: usize::MAX,
            max_total_bytes: u64::MAX,
            volume_bytes: None,
            verify: false,
        }
    }

    /// Checks the plan against the count and size limits
    pub fn check(&self, plan: &ArchivePlacementPlan) -> Result<()> {
        if plan.len() > self.max_file_count {
            return Err(CourierError::Validation(format!(
                "archive file count exceeds limit: {} > {}",
                plan.len(),
                self.max_file_count
            )));
        }

        let total = plan.total_size();
        if total > self.max_total_bytes {
            return Err(CourierError::Validation(format!(
                "archive size exceeds limit: {:.1} MB > {} MB",
                total as f64 / MB as f64,
                self.max_total_bytes / MB
            )));
        }
        Ok(())
    }
}

/// A planned file that did not make it into the archive
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub file_id: FileId,
    pub reason: String,
}

/// A file written into the archive
#[derive(Debug, Clone)]
pub struct WrittenEntry {
    pub file_id: FileId,
    pub archive_path: String,
    pub size: u64,

    /// Zero-based index into [`ArchiveOutcome::volumes`]
    pub volume: usize,
}

/// Per-entry notification passed to the build callback
#[derive(Debug, Clone, Copy)]
pub enum EntryEvent<'a> {
    Written(&'a PlacementEntry),
    Skipped(&'a PlacementEntry, &'a str),
}

/// Result of an archive build
#[derive(Debug, Clone)]
pub struct ArchiveOutcome {
    pub volumes: Vec<PathBuf>,
    pub written: Vec<WrittenEntry>,
    pub skipped: Vec<SkippedEntry>,
    pub uncompressed_size: u64,
    pub archive_size: u64,
    pub compression_ratio: f64,

    /// The build stopped early at a cancellation checkpoint
    pub cancelled: bool,
    pub verification: Option<VerificationReport>,
}

impl ArchiveOutcome {
    /// Output location: the archive itself, or its directory for multi-volume builds
    pub fn artifact_path(&self, output_dir: &Path) -> PathBuf {
        match self.volumes.as_slice() {
            [single] => single.clone(),
            _ => output_dir.to_path_buf(),
        }
    }
}

/// Removes plan entries whose source file is missing or not a regular file
pub fn drop_unreadable(plan: &mut ArchivePlacementPlan) -> Vec<SkippedEntry> {
    plan.retain(|entry| {
        fs::metadata(&entry.artifact.path)
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    })
    .into_iter()
    .map(|entry| SkippedEntry {
        reason: format!(
            "file not readable: {} ({})",
            entry.artifact.original_name, entry.artifact.file_id
        ),
        file_id: entry.artifact.file_id,
    })
    .collect()
}

/// Writes `plan` into zip volumes under `request.output_dir`
///
/// `on_entry` is called once per planned entry, in plan order. Metadata files
/// go into the first volume only and list the entries actually written.
///
/// # Errors
///
/// Returns `Validation` when the plan breaks `limits` or places a file at a
/// metadata path (nothing is written) and `ArchiveWrite` when a volume cannot
/// be written.
pub fn build_archive<F>(
    plan: &ArchivePlacementPlan,
    request: &ArchiveRequest,
    limits: &ArchiveLimits,
    cancel: &CancellationToken,
    mut on_entry: F,
) -> Result<ArchiveOutcome>
where
    F: FnMut(EntryEvent<'_>),
{
    limits.check(plan)?;
    let reserved = request.metadata_files.reserved_paths();
    if let Some(clash) = plan
        .entries()
        .iter()
        .find(|entry| reserved.contains(&entry.archive_path.as_str()))
    {
        return Err(CourierError::Validation(format!(
            "archive path {} is reserved for metadata ({})",
            clash.archive_path, clash.artifact.file_id
        )));
    }
    fs::create_dir_all(&request.output_dir).with_context(|| {
        format!("Failed to create archive directory {}", request.output_dir.display())
    })?;

    let volumes = plan.volumes(limits.volume_bytes);
    let volume_paths = volume_paths(&request.output_dir, &request.name, volumes.len());
    let options = entry_options(request.compression);

    tracing::debug!(
        archive = %request.name,
        entries = plan.len(),
        volumes = volumes.len(),
        "Writing archive"
    );

    let mut outcome = ArchiveOutcome {
        volumes: Vec::new(),
        written: Vec::new(),
        skipped: Vec::new(),
        uncompressed_size: 0,
        archive_size: 0,
        compression_ratio: 1.0,
        cancelled: false,
        verification: None,
    };

    let mut first_volume: Option<ZipWriter<File>> = None;

    'volumes: for (index, (entries, path)) in volumes.iter().zip(&volume_paths).enumerate() {
        let mut writer = ZipWriter::new(File::create(path)?);
        outcome.volumes.push(path.clone());

        for entry in entries.iter() {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                finish_volume(writer, path)?;
                break 'volumes;
            }

            match write_entry(&mut writer, entry, options)? {
                Ok(size) => {
                    outcome.uncompressed_size += size;
                    outcome.written.push(WrittenEntry {
                        file_id: entry.artifact.file_id.clone(),
                        archive_path: entry.archive_path.clone(),
                        size,
                        volume: index,
                    });
                    on_entry(EntryEvent::Written(entry));
                }
                Err(reason) => {
                    tracing::warn!(
                        file_id = %entry.artifact.file_id,
                        reason = %reason,
                        "Skipping archive entry"
                    );
                    on_entry(EntryEvent::Skipped(entry, &reason));
                    outcome.skipped.push(SkippedEntry {
                        file_id: entry.artifact.file_id.clone(),
                        reason,
                    });
                }
            }
        }

        if index == 0 {
            first_volume = Some(writer);
        } else {
            finish_volume(writer, path)?;
        }
    }

    if let Some(mut writer) = first_volume {
        if !outcome.cancelled && request.metadata_files.any() {
            let written: Vec<PlacementEntry> = plan
                .entries()
                .iter()
                .filter(|e| outcome.written.iter().any(|w| w.archive_path == e.archive_path))
                .cloned()
                .collect();
            let description = ArchiveDescription {
                name: &request.name,
                structure: request.structure,
                compression: request.compression,
                volume_count: outcome.volumes.len(),
                created_at: Utc::now(),
            };
            write_metadata(&mut writer, &description, &written, request.metadata_files, options)?;
        }
        finish_volume(writer, &volume_paths[0])?;
    }

    for volume in &outcome.volumes {
        outcome.archive_size += fs::metadata(volume)?.len();
    }
    if outcome.uncompressed_size > 0 {
        outcome.compression_ratio = outcome.archive_size as f64 / outcome.uncompressed_size as f64;
    }

    if limits.verify && !outcome.cancelled {
        let expected: Vec<ExpectedEntry> = outcome
            .written
            .iter()
            .map(|w| ExpectedEntry {
                archive_path: w.archive_path.clone(),
                size: w.size,
            })
            .collect();
        outcome.verification = Some(verify_archive(&outcome.volumes, &expected));
    }

    tracing::info!(
        archive = %request.name,
        written = outcome.written.len(),
        skipped = outcome.skipped.len(),
        archive_size = outcome.archive_size,
        compression_ratio = outcome.compression_ratio,
        cancelled = outcome.cancelled,
        "Archive written"
    );

    Ok(outcome)
}

fn volume_paths(dir: &Path, name: &str, count: usize) -> Vec<PathBuf> {
    if count <= 1 {
        return vec![dir.join(format!("{name}.zip"))];
    }
    (1..=count)
        .map(|n| dir.join(format!("{name}_vol{n:02}.zip")))
        .collect()
}

fn entry_options(compression: CompressionSettings) -> SimpleFileOptions {
    let base = SimpleFileOptions::default()
        .large_file(true)
        .unix_permissions(0o644);

    let level = i64::from(compression.level.min(9));
    match compression.method {
        CompressionMethod::Stored => base.compression_method(zip::CompressionMethod::Stored),
        _ if level == 0 => base.compression_method(zip::CompressionMethod::Stored),
        CompressionMethod::Deflated => base
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(Some(level)),
        CompressionMethod::Bzip2 => base
            .compression_method(zip::CompressionMethod::Bzip2)
            .compression_level(Some(level)),
    }
}

/// Streams one source file into the archive
///
/// The outer error aborts the build; the inner one skips the entry. A source
/// that cannot be opened is skipped before its entry is started.
fn write_entry(
    writer: &mut ZipWriter<File>,
    entry: &PlacementEntry,
    options: SimpleFileOptions,
) -> Result<std::result::Result<u64, String>> {
    let source = match File::open(&entry.artifact.path) {
        Ok(file) => file,
        Err(e) => {
            return Ok(Err(format!(
                "file not readable: {} ({e})",
                entry.artifact.original_name
            )))
        }
    };

    writer
        .start_file(entry.archive_path.as_str(), options)
        .map_err(|e| CourierError::ArchiveWrite(format!("{}: {e}", entry.archive_path)))?;
    let size = io::copy(&mut BufReader::new(source), writer).map_err(|e| {
        CourierError::ArchiveWrite(format!("failed to write {}: {e}", entry.archive_path))
    })?;

    Ok(Ok(size))
}

fn write_metadata(
    writer: &mut ZipWriter<File>,
    description: &ArchiveDescription<'_>,
    entries: &[PlacementEntry],
    files: MetadataFiles,
    options: SimpleFileOptions,
) -> Result<()> {
    if files.manifest {
        let manifest = serde_json::to_vec_pretty(&build_manifest(description, entries))?;
        write_bytes(writer, MANIFEST_FILE, &manifest, options)?;
    }
    if files.csv_index {
        write_bytes(writer, CSV_INDEX_FILE, build_csv_index(entries).as_bytes(), options)?;
    }
    if files.readme {
        write_bytes(writer, README_FILE, build_readme(description, entries).as_bytes(), options)?;
    }
    Ok(())
}

fn write_bytes(
    writer: &mut ZipWriter<File>,
    name: &str,
    data: &[u8],
    options: SimpleFileOptions,
) -> Result<()> {
    writer
        .start_file(name, options)
        .map_err(|e| CourierError::ArchiveWrite(format!("{name}: {e}")))?;
    writer.write_all(data)?;
    Ok(())
}

fn finish_volume(writer: ZipWriter<File>, path: &Path) -> Result<()> {
    let file = writer
        .finish()
        .map_err(|e| CourierError::ArchiveWrite(format!("{}: {e}", path.display())))?;
    file.sync_all()?;
    Ok(())
}
