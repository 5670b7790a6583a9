//! Directory-backed artifact store
//!
//! File ids are paths relative to a root directory.

use crate::adapters::store::traits::ArtifactStore;
use crate::core::verification::checksum::calculate_checksum_file;
use crate::domain::artifact::{content_type_for, StoredArtifact};
use crate::domain::errors::CourierError;
use crate::domain::ids::FileId;
use crate::domain::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Artifact store over a local directory tree
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a file id onto a path under the root
    fn locate(&self, file_id: &FileId) -> Result<PathBuf> {
        let relative = Path::new(file_id.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(CourierError::Validation(format!(
                "file id must be a relative path inside the store: {file_id}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn resolve(&self, file_id: &FileId) -> Result<Option<StoredArtifact>> {
        let path = self.locate(file_id)?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let checksum_path = path.clone();
        let checksum = tokio::task::spawn_blocking(move || calculate_checksum_file(&checksum_path))
            .await
            .map_err(|e| CourierError::Other(format!("checksum task failed: {e}")))??;

        let original_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file_id.as_str())
            .to_string();
        let created_at = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Some(StoredArtifact {
            file_id: file_id.clone(),
            content_type: content_type_for(&original_name).to_string(),
            original_name,
            path,
            size: metadata.len(),
            checksum,
            created_at,
            metadata: BTreeMap::new(),
        }))
    }
}
