//! Portfolio renderer abstraction

use crate::domain::options::PortfolioOptions;
use crate::domain::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One asset as it appears in a portfolio
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioAsset {
    pub file_id: String,
    pub title: String,
    pub original_name: String,

    /// Path of the copied asset relative to the portfolio root
    pub image_path: String,
    pub size: u64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Renders the portfolio index page
#[async_trait]
pub trait PortfolioRenderer: Send + Sync {
    /// Render `index.html` for `assets`
    ///
    /// # Errors
    ///
    /// Returns a `Render` error when the page cannot be produced.
    async fn render(&self, assets: &[PortfolioAsset], options: &PortfolioOptions) -> Result<String>;
}
