//! `SharedStore` — the consumed backing-store capability for
//! `SharedMemory` (§6). Any store satisfying append, prefix-list,
//! point-get, and size-bounded eviction is acceptable; the reference
//! implementation lives in `research-agent::shared_memory`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub ttl: Duration,
}

#[async_trait]
pub trait SharedStore: Send + Sync {
    async fn put(&self, key: &str, value: serde_json::Value, metadata: StoreMetadata) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
