//! Archive read-back verification
//!
//! Reopens every written volume and reads each planned entry to the end, which
//! makes the zip reader validate the stored CRC.

use crate::core::verification::report::VerificationReport;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use zip::ZipArchive;

/// An entry the archive is expected to contain
#[derive(Debug, Clone)]
pub struct ExpectedEntry {
    pub archive_path: String,
    pub size: u64,
}

/// Verifies that `volumes` together hold every expected entry intact
///
/// A volume that cannot be opened fails every entry that is not found in
/// another volume.
pub fn verify_archive(volumes: &[PathBuf], expected: &[ExpectedEntry]) -> VerificationReport {
    let started = Instant::now();
    let mut report = VerificationReport::start(volumes.len());

    tracing::info!(
        volumes = volumes.len(),
        entries = expected.len(),
        "Starting archive verification"
    );

    let mut archives = Vec::with_capacity(volumes.len());
    for volume in volumes {
        match File::open(volume)
            .map_err(zip::result::ZipError::Io)
            .and_then(ZipArchive::new)
        {
            Ok(archive) => {
                report.volumes_opened += 1;
                archives.push(archive);
            }
            Err(e) => {
                tracing::warn!(volume = %volume.display(), error = %e, "Cannot open archive volume");
            }
        }
    }

    for entry in expected {
        let outcome = check_entry(&mut archives, entry);
        if let Err(reason) = &outcome {
            tracing::warn!(entry = %entry.archive_path, reason = %reason, "Archive entry failed verification");
        }
        report.record(&entry.archive_path, outcome);
    }

    let report = report.finish(started);

    tracing::info!(
        passed = report.passed,
        failed = report.failed,
        duration_ms = report.duration_ms,
        "Archive verification completed"
    );

    report
}

fn check_entry(archives: &mut [ZipArchive<File>], entry: &ExpectedEntry) -> Result<u64, String> {
    for archive in archives.iter_mut() {
        let Ok(mut file) = archive.by_name(&entry.archive_path) else {
            continue;
        };

        if file.size() != entry.size {
            return Err(format!(
                "size mismatch: expected {}, found {}",
                entry.size,
                file.size()
            ));
        }

        let read = io::copy(&mut file, &mut io::sink()).map_err(|e| format!("unreadable: {e}"))?;
        if read != entry.size {
            return Err(format!("short read: expected {}, read {}", entry.size, read));
        }
        return Ok(read);
    }

    Err("entry missing from archive".to_string())
}
