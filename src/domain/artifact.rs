//! Stored artifact model
//!
//! A [`StoredArtifact`] is what the artifact store reports for a file id:
//! where the bytes live and what is known about them.

use crate::domain::ids::FileId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A previously stored file resolved from the artifact store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub file_id: FileId,

    /// Name the file was uploaded or generated under
    pub original_name: String,

    /// Location of the bytes on local disk
    pub path: PathBuf,

    /// Size in bytes
    pub size: u64,
    pub content_type: String,

    /// Hex-encoded SHA-256 of the content
    pub checksum: String,
    pub created_at: DateTime<Utc>,

    /// Free-form metadata (prompt, tags, dimensions, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl StoredArtifact {
    /// Lowercased extension of the original name, without the dot
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.original_name)
    }

    /// Original name without its extension
    pub fn stem(&self) -> &str {
        Path::new(&self.original_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.original_name)
    }

    pub fn is_image(&self) -> bool {
        matches!(
            self.extension().as_deref(),
            Some("jpg" | "jpeg" | "png" | "webp" | "gif")
        )
    }
}

/// Lowercased extension of a file name, without the dot
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_lowercase())
}

/// Best-effort MIME type for a file name
pub fn content_type_for(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("tif" | "tiff") => "image/tiff",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("json") => "application/json",
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html" | "htm") => "text/html",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}
