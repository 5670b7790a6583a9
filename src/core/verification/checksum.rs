//! Checksum calculation for stored files
//!
//! SHA-256 digests, hex encoded, are recorded for every resolved artifact and
//! listed in the archive manifest.

use crate::domain::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Calculate SHA-256 checksum of raw bytes
///
/// Returns a hex-encoded SHA-256 checksum string (64 characters).
///
/// # Examples
///
/// ```
/// use courier::core::verification::checksum::calculate_checksum_bytes;
///
/// let checksum = calculate_checksum_bytes(b"hello");
/// assert_eq!(checksum.len(), 64);
/// ```
pub fn calculate_checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();

    format!("{result:x}")
}

/// Calculate SHA-256 checksum of a file, streaming its contents
pub fn calculate_checksum_file(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    let result = hasher.finalize();
    Ok(format!("{result:x}"))
}

/// Verify that bytes match an expected checksum
pub fn verify_checksum(data: &[u8], expected: &str) -> bool {
    calculate_checksum_bytes(data).eq_ignore_ascii_case(expected)
}
