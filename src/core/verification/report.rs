//! Read-back results stored on an operation under `metadata.verification`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Outcome of re-reading every entry of a written archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verified_at: DateTime<Utc>,

    /// Volumes that opened as valid zip files
    pub volumes_opened: usize,
    pub volumes_expected: usize,

    pub total_verified: usize,
    pub passed: usize,
    pub failed: usize,

    /// Uncompressed bytes read while checking CRCs
    pub bytes_read: u64,
    pub failures: Vec<VerificationFailure>,
    pub duration_ms: u64,
}

/// One entry that was missing, truncated or failed its CRC
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationFailure {
    /// Path inside the archive
    pub entry: String,
    pub reason: String,
}

impl VerificationReport {
    pub(crate) fn start(volumes_expected: usize) -> Self {
        Self {
            verified_at: Utc::now(),
            volumes_opened: 0,
            volumes_expected,
            total_verified: 0,
            passed: 0,
            failed: 0,
            bytes_read: 0,
            failures: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Records the check of one entry; `Ok` carries the bytes read
    pub(crate) fn record(&mut self, entry: &str, outcome: Result<u64, String>) {
        self.total_verified += 1;
        match outcome {
            Ok(read) => {
                self.passed += 1;
                self.bytes_read += read;
            }
            Err(reason) => {
                self.failed += 1;
                self.failures.push(VerificationFailure {
                    entry: entry.to_string(),
                    reason,
                });
            }
        }
    }

    pub(crate) fn finish(mut self, started: Instant) -> Self {
        self.duration_ms = started.elapsed().as_millis() as u64;
        self
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// One-line description of the failures, `None` when every entry passed
    ///
    /// Lists at most three entries.
    pub fn failure_summary(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }

        let shown: Vec<String> = self
            .failures
            .iter()
            .take(3)
            .map(|f| format!("{} ({})", f.entry, f.reason))
            .collect();
        let more = self.failures.len().saturating_sub(shown.len());

        let mut summary = format!(
            "archive verification failed for {} of {} entries: {}",
            self.failed,
            self.total_verified,
            shown.join(", ")
        );
        if more > 0 {
            summary.push_str(&format!(" and {more} more"));
        }
        Some(summary)
    }
}
