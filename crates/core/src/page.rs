//! `PageRecord` — an immutable vector-store search hit.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub doc_source: String,
    pub page_num: u32,
    /// Opaque handle to the page's rendered image (e.g. a storage key
    /// or path); resolved by collaborators outside the core.
    pub file_path: String,
    pub markdown_text: String,
    pub similarity_score: f32,
    pub image_bytes: Option<Vec<u8>>,
}

impl PageRecord {
    /// Stable identity for dedup/citation purposes.
    pub fn key(&self) -> (String, u32) {
        (self.doc_source.clone(), self.page_num)
    }
}
