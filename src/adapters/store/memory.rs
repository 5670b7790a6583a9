//! In-memory artifact registry
//!
//! Holds `StoredArtifact` records registered by the embedding application.
//! The bytes still live on disk at each record's `path`.

use crate::adapters::store::traits::ArtifactStore;
use crate::domain::artifact::StoredArtifact;
use crate::domain::ids::FileId;
use crate::domain::Result;
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifacts: DashMap<FileId, StoredArtifact>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces an artifact under its own file id
    pub fn insert(&self, artifact: StoredArtifact) {
        self.artifacts.insert(artifact.file_id.clone(), artifact);
    }

    pub fn remove(&self, file_id: &FileId) -> Option<StoredArtifact> {
        self.artifacts.remove(file_id).map(|(_, artifact)| artifact)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn resolve(&self, file_id: &FileId) -> Result<Option<StoredArtifact>> {
        Ok(self.artifacts.get(file_id).map(|entry| entry.clone()))
    }
}
