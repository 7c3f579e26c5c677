//! `SharedMemory`: cross-subagent discovery sharing and the
//! per-specialist result cache (§4.6).
//!
//! Reference implementation of [`research_core::SharedStore`]: an
//! in-process store behind `parking_lot::RwLock`-guarded maps,
//! shard-per-prefix (`discovery:` and `cache:` are independent maps)
//! so discovery writes and cache lookups never contend on the same
//! lock — mirroring the teacher's `ConversationMemory` layering of
//! working/episodic/semantic stores behind independent locks.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use research_config::CacheConfig;
use research_core::{CacheEntry, Result, SharedDiscovery, SharedStore, SpecialistType, StoreMetadata, SubagentResult};

const MIN_KEYWORD_LEN: usize = 3;
const MAX_KEYWORDS: usize = 10;
const MAX_RELEVANT: usize = 5;
const CACHE_SIMILARITY_THRESHOLD: f32 = 0.7;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "with", "this", "that", "from", "have", "what", "how", "does",
    "why", "who", "when",
];

pub struct SharedMemory {
    discoveries: RwLock<HashMap<String, SharedDiscovery>>,
    cache: RwLock<HashMap<String, CacheEntry>>,
    cache_order: RwLock<VecDeque<String>>,
    cache_config: CacheConfig,
}

impl SharedMemory {
    pub fn new(cache_config: CacheConfig) -> Self {
        Self {
            discoveries: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
            cache_order: RwLock::new(VecDeque::new()),
            cache_config,
        }
    }

    /// Publish a discovery. Keywords are tokens longer than 3 chars,
    /// not in the stopword list, unique, capped at 10.
    pub async fn share(&self, agent_id: &str, payload: serde_json::Value) {
        let timestamp = Utc::now();
        let text = payload.to_string();
        let keywords = extract_keywords(&text);
        let discovery = SharedDiscovery {
            producer_agent_id: agent_id.to_string(),
            timestamp,
            payload: text,
            keywords,
        };
        let key = format!(
            "discovery:{agent_id}:{}",
            timestamp.timestamp_nanos_opt().unwrap_or_default()
        );
        self.discoveries.write().insert(key, discovery);
    }

    /// Discoveries from other agents whose keywords intersect the
    /// query's tokens, newest first, capped at 5.
    pub async fn relevant(&self, query: &str, excluding_agent_id: &str) -> Vec<SharedDiscovery> {
        let query_tokens = tokenize(query);
        let mut matches: Vec<SharedDiscovery> = self
            .discoveries
            .read()
            .values()
            .filter(|d| d.producer_agent_id != excluding_agent_id)
            .filter(|d| d.keywords.iter().any(|k| query_tokens.contains(k)))
            .cloned()
            .collect();
        matches.sort_by_key(|d| std::cmp::Reverse(d.timestamp));
        matches.truncate(MAX_RELEVANT);
        matches
    }

    /// Cache probe: Jaccard similarity over whitespace tokens against
    /// cached queries for the same specialist; first match above
    /// threshold (that has not expired) wins.
    pub async fn cache_get(&self, specialist: SpecialistType, query: &str) -> Option<SubagentResult> {
        let query_tokens = tokenize(query);
        let now = Utc::now();
        self.cache
            .read()
            .values()
            .filter(|entry| entry.result.specialist_type == specialist)
            .filter(|entry| !entry.is_expired(now))
            .find(|entry| jaccard(&query_tokens, &tokenize(&entry.query_fingerprint)) > CACHE_SIMILARITY_THRESHOLD)
            .map(|entry| entry.result.clone())
    }

    /// Store a cache entry, evicting the least-recently-inserted entry
    /// once `max_size` is exceeded.
    pub async fn cache_put(&self, agent_id: &str, query: &str, result: SubagentResult) {
        let entry = CacheEntry {
            query_fingerprint: query.to_string(),
            result,
            agent_id: agent_id.to_string(),
            timestamp: Utc::now(),
            ttl: Duration::from_secs(self.cache_config.ttl_s),
        };
        let key = format!("cache:{agent_id}:{}", entry.timestamp.timestamp_nanos_opt().unwrap_or_default());

        let mut cache = self.cache.write();
        let mut order = self.cache_order.write();
        cache.insert(key.clone(), entry);
        order.push_back(key);

        while cache.len() > self.cache_config.max_size {
            if let Some(oldest) = order.pop_front() {
                cache.remove(&oldest);
            } else {
                break;
            }
        }

        let now = Utc::now();
        let expired: Vec<String> = cache
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in expired {
            cache.remove(&key);
            order.retain(|k| k != &key);
        }
    }

    pub fn discovery_count(&self) -> usize {
        self.discoveries.read().len()
    }

    pub fn cache_size(&self) -> usize {
        self.cache.read().len()
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    for token in tokenize(text) {
        if token.len() > MIN_KEYWORD_LEN && !STOPWORDS.contains(&token.as_str()) && seen.insert(token.clone()) {
            keywords.push(token);
            if keywords.len() >= MAX_KEYWORDS {
                break;
            }
        }
    }
    keywords
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}

/// Generic `SharedStore` surface atop the same prefixed maps, for
/// collaborators that only need the abstract append/get/list contract.
#[async_trait]
impl SharedStore for SharedMemory {
    async fn put(&self, key: &str, value: serde_json::Value, _metadata: StoreMetadata) -> Result<()> {
        if let Some(agent_id) = key.strip_prefix("discovery:").and_then(|rest| rest.split(':').next()) {
            self.share(agent_id, value).await;
        } else if key.starts_with("cache:") {
            if let Ok(entry) = serde_json::from_value::<CacheEntry>(value) {
                self.cache_put(&entry.agent_id, &entry.query_fingerprint, entry.result).await;
            }
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        if key.starts_with("discovery:") {
            Ok(self
                .discoveries
                .read()
                .get(key)
                .and_then(|d| serde_json::to_value(d).ok()))
        } else if key.starts_with("cache:") {
            Ok(self
                .cache
                .read()
                .get(key)
                .and_then(|e| serde_json::to_value(e).ok()))
        } else {
            Ok(None)
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        if prefix.starts_with("discovery") {
            Ok(self.discoveries.read().keys().cloned().collect())
        } else if prefix.starts_with("cache") {
            Ok(self.cache.read().keys().cloned().collect())
        } else {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_core::{Priority, RunStatus, SubagentTask};

    fn cache_config() -> CacheConfig {
        CacheConfig { max_size: 2, ttl_s: 3600 }
    }

    fn dummy_result(specialist: SpecialistType) -> SubagentResult {
        SubagentResult {
            specialist_type: specialist,
            final_task: SubagentTask::new(specialist, vec![], vec![], String::new(), vec![], 0.6, 5, Priority::High, false),
            final_evaluation: None,
            extracted_information: "raft is a consensus protocol".to_string(),
            confidence: 0.8,
            sources_used: vec![],
            iterations_performed: 1,
            processing_time: Duration::from_secs(1),
            status: RunStatus::Completed,
            failure_reason: None,
        }
    }

    #[tokio::test]
    async fn share_and_relevant_excludes_producer() {
        let memory = SharedMemory::new(cache_config());
        memory.share("agent-1", serde_json::json!({"note": "raft consensus leader election"})).await;
        let found = memory.relevant("raft leader election protocol", "agent-1").await;
        assert!(found.is_empty());
        let found = memory.relevant("raft leader election protocol", "agent-2").await;
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn cache_hit_on_similar_query() {
        let memory = SharedMemory::new(cache_config());
        memory
            .cache_put("agent-1", "what is the raft consensus protocol", dummy_result(SpecialistType::Conceptual))
            .await;
        let hit = memory.cache_get(SpecialistType::Conceptual, "what is the raft consensus protocol exactly").await;
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn cache_miss_for_different_specialist() {
        let memory = SharedMemory::new(cache_config());
        memory
            .cache_put("agent-1", "what is raft", dummy_result(SpecialistType::Conceptual))
            .await;
        let hit = memory.cache_get(SpecialistType::Technical, "what is raft").await;
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn cache_evicts_oldest_beyond_max_size() {
        let memory = SharedMemory::new(cache_config());
        memory.cache_put("a1", "query one", dummy_result(SpecialistType::General)).await;
        memory.cache_put("a2", "query two", dummy_result(SpecialistType::General)).await;
        memory.cache_put("a3", "query three", dummy_result(SpecialistType::General)).await;
        assert_eq!(memory.cache_size(), 2);
    }
}
