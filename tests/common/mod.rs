//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use courier::adapters::{ArtifactStore, Collaborators, FileTransformer, InMemoryArtifactStore};
use courier::config::CourierConfig;
use courier::core::export::ExportOrchestrator;
use courier::core::verification::checksum::calculate_checksum_bytes;
use courier::domain::artifact::content_type_for;
use courier::domain::{CourierError, FileId, Result, StoredArtifact, TransformSpec};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Temporary source directory backed by an in-memory artifact store
pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<InMemoryArtifactStore>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("source")).unwrap();
        Self {
            dir,
            store: Arc::new(InMemoryArtifactStore::new()),
        }
    }

    pub fn source_dir(&self) -> PathBuf {
        self.dir.path().join("source")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.dir.path().join("exports")
    }

    /// Writes `bytes` under `name` and registers it with the store
    pub fn add_file(&self, name: &str, bytes: &[u8]) -> FileId {
        let path = self.source_dir().join(name);
        std::fs::write(&path, bytes).unwrap();

        let file_id = FileId::new(name).unwrap();
        self.store.insert(StoredArtifact {
            file_id: file_id.clone(),
            original_name: name.to_string(),
            path,
            size: bytes.len() as u64,
            content_type: content_type_for(name).to_string(),
            checksum: calculate_checksum_bytes(bytes),
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
            metadata: BTreeMap::new(),
        });
        file_id
    }

    /// Registers `count` highly compressible files named `file_N.png`
    pub fn add_files(&self, count: usize, size: usize) -> Vec<FileId> {
        (0..count)
            .map(|i| self.add_file(&format!("file_{i}.png"), &vec![b'a'; size]))
            .collect()
    }

    /// Test configuration: exports under the temp dir, sweeper disabled
    pub fn config(&self) -> CourierConfig {
        let mut config = CourierConfig::default();
        config.export.export_dir = self.export_dir();
        config.storage.source_dir = self.source_dir();
        config.downloads.cleanup_interval_secs = 0;
        config
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::with_store(self.store.clone())
    }

    pub async fn orchestrator(&self) -> ExportOrchestrator {
        self.orchestrator_with(self.config(), self.collaborators()).await
    }

    pub async fn orchestrator_with(
        &self,
        config: CourierConfig,
        collaborators: Collaborators,
    ) -> ExportOrchestrator {
        ExportOrchestrator::new(config, collaborators).await.unwrap()
    }
}

pub fn ids(raw: &[&str]) -> Vec<FileId> {
    raw.iter().map(|s| FileId::new(*s).unwrap()).collect()
}

/// Transformer that sleeps before returning the source bytes
pub struct SlowTransformer {
    pub delay: Duration,
}

#[async_trait]
impl FileTransformer for SlowTransformer {
    async fn transform(&self, source: &Path, _spec: &TransformSpec) -> Result<Vec<u8>> {
        tokio::time::sleep(self.delay).await;
        tokio::fs::read(source)
            .await
            .map_err(|e| CourierError::Transform(e.to_string()))
    }
}

/// Transformer that rejects files whose name contains `fail`
pub struct FailingTransformer;

#[async_trait]
impl FileTransformer for FailingTransformer {
    async fn transform(&self, source: &Path, _spec: &TransformSpec) -> Result<Vec<u8>> {
        if source.to_string_lossy().contains("fail") {
            return Err(CourierError::Transform("unsupported image".to_string()));
        }
        tokio::fs::read(source)
            .await
            .map_err(|e| CourierError::Transform(e.to_string()))
    }
}

pub fn slow_collaborators(fixture: &Fixture, delay: Duration) -> Collaborators {
    fixture
        .collaborators()
        .with_transformer(Arc::new(SlowTransformer { delay }))
}

/// Store whose lookups never return for ids containing `stuck`
pub struct HangingStore {
    pub inner: Arc<InMemoryArtifactStore>,
}

#[async_trait]
impl ArtifactStore for HangingStore {
    async fn resolve(&self, file_id: &FileId) -> Result<Option<StoredArtifact>> {
        if file_id.as_str().contains("stuck") {
            std::future::pending::<()>().await;
        }
        self.inner.resolve(file_id).await
    }
}

pub fn hanging_collaborators(fixture: &Fixture) -> Collaborators {
    Collaborators::with_store(Arc::new(HangingStore {
        inner: fixture.store.clone(),
    }))
}
