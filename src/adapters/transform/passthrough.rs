//! Transformer that copies bytes unchanged

use crate::adapters::transform::traits::FileTransformer;
use crate::domain::errors::CourierError;
use crate::domain::options::TransformSpec;
use crate::domain::Result;
use async_trait::async_trait;
use std::path::Path;

/// Returns the source bytes as they are
///
/// Pixel work is left to real transformers; the orchestrator still names the
/// output after the requested format.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransformer;

#[async_trait]
impl FileTransformer for PassthroughTransformer {
    async fn transform(&self, source: &Path, _spec: &TransformSpec) -> Result<Vec<u8>> {
        tokio::fs::read(source).await.map_err(|e| {
            CourierError::Transform(format!("failed to read {}: {e}", source.display()))
        })
    }
}
