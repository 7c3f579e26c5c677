//! `SubagentResult`, `SharedDiscovery`, `CacheEntry`, `FinalResult`,
//! and the quality-metrics rubric.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decomposition::Decomposition;
use crate::evaluation::SearchEvaluation;
use crate::page::PageRecord;
use crate::query::SpecialistType;
use crate::task::SubagentTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubagentResult {
    pub specialist_type: SpecialistType,
    pub final_task: SubagentTask,
    pub final_evaluation: Option<SearchEvaluation>,
    pub extracted_information: String,
    pub confidence: f32,
    pub sources_used: Vec<PageRecord>,
    pub iterations_performed: usize,
    pub processing_time: Duration,
    pub status: RunStatus,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedDiscovery {
    pub producer_agent_id: String,
    pub timestamp: DateTime<Utc>,
    pub payload: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub query_fingerprint: String,
    pub result: SubagentResult,
    pub agent_id: String,
    pub timestamp: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.timestamp);
        age.to_std().map(|a| a > self.ttl).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub query_relevance: f32,
    pub completeness: f32,
    pub coherence: f32,
    pub source_utilization: f32,
    pub clarity: f32,
    pub overall: f32,
}

impl QualityMetrics {
    /// Compute `overall` as the arithmetic mean of the five sub-scores,
    /// maintaining the invariant checked in §8.
    pub fn new(
        query_relevance: f32,
        completeness: f32,
        coherence: f32,
        source_utilization: f32,
        clarity: f32,
    ) -> Self {
        let overall =
            (query_relevance + completeness + coherence + source_utilization + clarity) / 5.0;
        Self {
            query_relevance,
            completeness,
            coherence,
            source_utilization,
            clarity,
            overall,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitedSource {
    pub document: String,
    pub page_number: u32,
    pub similarity_score: f32,
    pub specialist_type: SpecialistType,
    pub relevance_level: String,
    pub quality_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResult {
    pub original_query: String,
    pub decomposition: Decomposition,
    pub subagent_results: Vec<SubagentResult>,
    pub synthesis_instructions: String,
    pub final_answer: String,
    pub confidence: f32,
    pub sources_cited: Vec<CitedSource>,
    pub quality_metrics: QualityMetrics,
    pub reasoning_trace: Vec<String>,
    pub total_processing_time: Duration,
    pub status: RunStatus,
    pub enhanced: bool,
    pub error: Option<String>,
}

impl FinalResult {
    /// Deduplicate sources by (doc_source, page_num), keeping the
    /// highest quality_score for duplicates, sorted by quality_score
    /// descending — the invariant checked in §8.
    pub fn build_sources_cited(results: &[SubagentResult], scored: impl Fn(&PageRecord) -> f32) -> Vec<CitedSource> {
        use std::collections::HashMap;

        let mut best: HashMap<(String, u32), CitedSource> = HashMap::new();
        for result in results {
            for page in &result.sources_used {
                let quality = scored(page);
                let key = page.key();
                let candidate = CitedSource {
                    document: page.doc_source.clone(),
                    page_number: page.page_num,
                    similarity_score: page.similarity_score,
                    specialist_type: result.specialist_type,
                    relevance_level: result
                        .final_evaluation
                        .as_ref()
                        .and_then(|e| e.doc_evals.iter().find(|d| d.page.key() == key))
                        .map(|d| format!("{:?}", d.relevance))
                        .unwrap_or_else(|| "unknown".to_string()),
                    quality_score: quality,
                };
                best.entry(key)
                    .and_modify(|existing| {
                        if candidate.quality_score > existing.quality_score {
                            *existing = candidate.clone();
                        }
                    })
                    .or_insert(candidate);
            }
        }

        let mut sources: Vec<CitedSource> = best.into_values().collect();
        sources.sort_by(|a, b| {
            b.quality_score
                .partial_cmp(&a.quality_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_metrics_overall_is_mean() {
        let m = QualityMetrics::new(0.8, 0.6, 0.7, 0.5, 0.9);
        let expected = (0.8_f32 + 0.6 + 0.7 + 0.5 + 0.9) / 5.0;
        assert!((m.overall - expected).abs() < 1e-6);
    }

    #[test]
    fn cache_entry_respects_ttl() {
        use crate::query::SpecialistType;
        use crate::task::{Priority, SubagentTask};

        let result = SubagentResult {
            specialist_type: SpecialistType::General,
            final_task: SubagentTask::new(
                SpecialistType::General,
                vec![],
                vec![],
                String::new(),
                vec![],
                0.5,
                5,
                Priority::High,
                false,
            ),
            final_evaluation: None,
            extracted_information: String::new(),
            confidence: 0.5,
            sources_used: vec![],
            iterations_performed: 1,
            processing_time: Duration::from_secs(1),
            status: RunStatus::Completed,
            failure_reason: None,
        };
        let entry = CacheEntry {
            query_fingerprint: "abc".to_string(),
            result,
            agent_id: "agent-1".to_string(),
            timestamp: Utc::now() - chrono::Duration::seconds(10),
            ttl: Duration::from_secs(5),
        };
        assert!(entry.is_expired(Utc::now()));
    }
}
