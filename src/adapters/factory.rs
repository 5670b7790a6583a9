//! Collaborator wiring
//!
//! This module bundles the external collaborators an orchestrator needs and
//! builds the local set from configuration.

use crate::adapters::render::{BuiltinPortfolioRenderer, PortfolioRenderer};
use crate::adapters::store::{ArtifactStore, LocalArtifactStore};
use crate::adapters::transform::{FileTransformer, PassthroughTransformer};
use crate::config::schema::StorageConfig;
use std::sync::Arc;

/// External capabilities used by the export orchestrator
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ArtifactStore>,
    pub transformer: Arc<dyn FileTransformer>,
    pub renderer: Arc<dyn PortfolioRenderer>,
}

impl Collaborators {
    /// Uses `store` with the passthrough transformer and built-in renderer
    pub fn with_store(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            transformer: Arc::new(PassthroughTransformer),
            renderer: Arc::new(BuiltinPortfolioRenderer),
        }
    }

    pub fn with_transformer(mut self, transformer: Arc<dyn FileTransformer>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn PortfolioRenderer>) -> Self {
        self.renderer = renderer;
        self
    }
}

/// Create collaborators backed by the local storage directory
pub fn create_local_collaborators(config: &StorageConfig) -> Collaborators {
    tracing::info!(
        source_dir = %config.source_dir.display(),
        "Creating local artifact store"
    );
    Collaborators::with_store(Arc::new(LocalArtifactStore::new(config.source_dir.clone())))
}
