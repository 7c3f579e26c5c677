//! `VectorStoreClient` — the consumed vector-store capability (§6).

use async_trait::async_trait;

use crate::error::Result;
use crate::page::PageRecord;

#[async_trait]
pub trait VectorStoreClient: Send + Sync {
    /// Embed free text into the store's fixed-dimension vector space.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Top-k similarity search; may return fewer than `limit` results,
    /// sorted by similarity descending.
    async fn search_top_k(&self, embedding: &[f32], limit: usize) -> Result<Vec<PageRecord>>;
}
