//! Artifact store abstraction
//!
//! The artifact store is the pool of previously stored files that exports
//! read from. Courier never writes to it.

use crate::domain::artifact::StoredArtifact;
use crate::domain::ids::FileId;
use crate::domain::Result;
use async_trait::async_trait;

/// Resolves opaque file ids to files on local disk
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Look up one file
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error when the store itself fails or the id is malformed.
    /// Callers treat both outcomes as a per-file problem.
    async fn resolve(&self, file_id: &FileId) -> Result<Option<StoredArtifact>>;
}
