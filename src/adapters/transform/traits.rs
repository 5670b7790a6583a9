//! File transformer abstraction

use crate::domain::options::TransformSpec;
use crate::domain::Result;
use async_trait::async_trait;
use std::path::Path;

/// Produces the exported bytes of one source file
///
/// Implementations convert formats, resize and watermark. A failure affects
/// only the file being transformed.
#[async_trait]
pub trait FileTransformer: Send + Sync {
    /// Transform the file at `source` according to `spec`
    ///
    /// # Errors
    ///
    /// Returns a `Transform` error when the file cannot be converted.
    async fn transform(&self, source: &Path, spec: &TransformSpec) -> Result<Vec<u8>>;
}
