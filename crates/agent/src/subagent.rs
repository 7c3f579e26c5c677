//! `Subagent`: the search-evaluate-refine execution envelope around
//! one `SubagentTask` (§4.3).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;

use research_config::Settings;
use research_core::{
    Error, PageRecord, Relevance, Result, RunStatus, SpecialistType, SubagentResult, SubagentTask,
    VectorStoreClient,
};
use research_rag::{DocumentAnalyzer, IterativeEvaluator};

use crate::circuit_breaker::CircuitBreaker;
use crate::retrier::{BackoffStrategy, Retrier};
use crate::shared_memory::SharedMemory;

const MAX_FINDINGS: usize = 10;
const DISCOVERY_PREVIEW_CHARS: usize = 500;

pub struct Subagent {
    agent_id: String,
    specialist: SpecialistType,
    vector_store: Arc<dyn VectorStoreClient>,
    document_analyzer: DocumentAnalyzer,
    shared_memory: Arc<SharedMemory>,
    semaphore: Arc<Semaphore>,
    circuit_breaker: CircuitBreaker,
    retrier: Retrier,
    attempt_timeout: Duration,
    max_iterations: usize,
}

impl Subagent {
    pub fn new(
        agent_id: impl Into<String>,
        specialist: SpecialistType,
        document_analyzer: DocumentAnalyzer,
        vector_store: Arc<dyn VectorStoreClient>,
        shared_memory: Arc<SharedMemory>,
        semaphore: Arc<Semaphore>,
        settings: &Settings,
        max_iterations: usize,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            specialist,
            vector_store,
            document_analyzer,
            shared_memory,
            semaphore,
            circuit_breaker: CircuitBreaker::new(
                settings.circuit_breaker.failure_threshold,
                Duration::from_secs(settings.circuit_breaker.recovery_timeout_s),
            ),
            retrier: Retrier::new(settings.retry.max_retries, BackoffStrategy::Exponential),
            attempt_timeout: Duration::from_secs(settings.concurrency.subagent_timeout_s),
            max_iterations,
        }
    }

    /// Always terminates with a well-formed `SubagentResult`, even on
    /// failure — the envelope never propagates an error upward.
    pub async fn run(&self, refined_query: &str, mut task: SubagentTask) -> SubagentResult {
        let start = Instant::now();

        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => return failed_result(task, start.elapsed(), "concurrency gate closed"),
        };

        if !self.circuit_breaker.allow_request() {
            return failed_result(task, start.elapsed(), "circuit breaker");
        }

        if let Some(cached) = self.shared_memory.cache_get(self.specialist, refined_query).await {
            return cached;
        }

        let discoveries = self.shared_memory.relevant(refined_query, &self.agent_id).await;
        if !discoveries.is_empty() {
            let constraint = discoveries
                .iter()
                .map(|d| d.payload.as_str())
                .collect::<Vec<_>>()
                .join(" | ");
            task.semantic_context = format!("{}\nrelated findings from other agents: {constraint}", task.semantic_context);
        }

        let planned_query = self.plan(refined_query);

        let mut final_eval = None;
        let mut performed = 0;
        for iteration in 1..=self.max_iterations {
            performed = iteration;
            let results = match self.search_with_resilience(&planned_query, &task).await {
                Ok(results) => {
                    self.circuit_breaker.record_success();
                    results
                }
                Err(err) => {
                    self.circuit_breaker.record_failure();
                    return failed_result(task, start.elapsed(), &format!("search failed: {err}"));
                }
            };

            let filtered: Vec<PageRecord> = results
                .into_iter()
                .filter(|p| p.similarity_score >= task.similarity_threshold)
                .collect();

            let evaluations = join_all(
                filtered
                    .iter()
                    .map(|page| self.document_analyzer.evaluate(page, refined_query, &task.focus_areas)),
            )
            .await;

            let search_eval = IterativeEvaluator::evaluate(&task, evaluations);
            let sufficient = search_eval.sufficient;
            final_eval = Some(search_eval);

            if sufficient || iteration == self.max_iterations {
                break;
            }
            task = IterativeEvaluator::refine_task(&task, final_eval.as_ref().unwrap());
        }

        let search_eval = match final_eval {
            Some(eval) => eval,
            None => return failed_result(task, start.elapsed(), "no search iterations ran"),
        };

        let relevant_docs: Vec<_> = search_eval
            .doc_evals
            .iter()
            .filter(|d| matches!(d.relevance, Relevance::HighlyRelevant | Relevance::Relevant))
            .collect();

        let extracted_information = extracted_information(&relevant_docs);
        let sources_used: Vec<PageRecord> = relevant_docs.iter().map(|d| d.page.clone()).collect();
        let mean_quality = if search_eval.doc_evals.is_empty() {
            0.0
        } else {
            search_eval.doc_evals.iter().map(|d| d.quality_score).sum::<f32>() / search_eval.doc_evals.len() as f32
        };
        let sufficient_score = if search_eval.sufficient { 1.0 } else { 0.0 };
        let confidence = search_eval.overall_relevance * 0.3
            + search_eval.coverage_completeness * 0.2
            + sufficient_score * 0.3
            + mean_quality * 0.2;

        let result = SubagentResult {
            specialist_type: self.specialist,
            final_task: task,
            confidence,
            sources_used,
            iterations_performed: performed,
            processing_time: start.elapsed(),
            status: RunStatus::Completed,
            failure_reason: None,
            final_evaluation: Some(search_eval),
            extracted_information,
        };

        let preview: String = result.extracted_information.chars().take(DISCOVERY_PREVIEW_CHARS).collect();
        self.shared_memory
            .share(&self.agent_id, serde_json::json!({ "summary": preview }))
            .await;
        self.shared_memory.cache_put(&self.agent_id, refined_query, result.clone()).await;

        result
    }

    /// Specialist-specific query transform: prepend domain words
    /// before planning a search.
    fn plan(&self, query: &str) -> String {
        match self.specialist.plan_prefix() {
            Some(prefix) => format!("{prefix} {query}"),
            None => query.to_string(),
        }
    }

    async fn search_with_resilience(&self, query: &str, task: &SubagentTask) -> Result<Vec<PageRecord>> {
        self.retrier
            .run(|| async {
                tokio::time::timeout(self.attempt_timeout, self.search_once(query, task.max_candidates))
                    .await
                    .unwrap_or(Err(Error::Timeout(self.attempt_timeout)))
            })
            .await
    }

    async fn search_once(&self, query: &str, limit: usize) -> Result<Vec<PageRecord>> {
        let embedding = self.vector_store.embed(query).await?;
        self.vector_store.search_top_k(&embedding, limit).await
    }
}

fn extracted_information(docs: &[&research_core::DocumentEvaluation]) -> String {
    let mut seen = HashSet::new();
    let mut findings = Vec::new();
    for doc in docs {
        for finding in &doc.key_findings {
            if seen.insert(finding.clone()) {
                findings.push(finding.clone());
                if findings.len() >= MAX_FINDINGS {
                    return findings.join(" ");
                }
            }
        }
    }
    findings.join(" ")
}

fn failed_result(task: SubagentTask, processing_time: Duration, reason: &str) -> SubagentResult {
    SubagentResult {
        specialist_type: task.specialist_type,
        final_task: task,
        final_evaluation: None,
        extracted_information: String::new(),
        confidence: 0.0,
        sources_used: vec![],
        iterations_performed: 0,
        processing_time,
        status: RunStatus::Failed,
        failure_reason: Some(reason.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_config::CacheConfig;
    use research_core::{ChatMessage, ChatParams, LanguageModel};

    struct StubVectorStore {
        pages: Vec<PageRecord>,
    }

    #[async_trait::async_trait]
    impl VectorStoreClient for StubVectorStore {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.1, 0.2, 0.3])
        }

        async fn search_top_k(&self, _embedding: &[f32], limit: usize) -> Result<Vec<PageRecord>> {
            Ok(self.pages.iter().take(limit).cloned().collect())
        }
    }

    struct StubLlm;

    #[async_trait::async_trait]
    impl LanguageModel for StubLlm {
        async fn chat(&self, _model: &str, _messages: &[ChatMessage], _params: ChatParams) -> Result<String> {
            Ok("HIGHLY_RELEVANT".to_string())
        }
    }

    fn page(score: f32) -> PageRecord {
        PageRecord {
            doc_source: "raft.pdf".to_string(),
            page_num: 1,
            file_path: "raft.pdf#1".to_string(),
            markdown_text: "raft consensus leader election".to_string(),
            similarity_score: score,
            image_bytes: None,
        }
    }

    fn subagent(pages: Vec<PageRecord>) -> Subagent {
        let vector_store = Arc::new(StubVectorStore { pages });
        let document_analyzer = DocumentAnalyzer::new(Arc::new(StubLlm), "test-model");
        let shared_memory = Arc::new(SharedMemory::new(CacheConfig { max_size: 100, ttl_s: 3600 }));
        let semaphore = Arc::new(Semaphore::new(4));
        Subagent::new(
            "agent-1",
            SpecialistType::Conceptual,
            document_analyzer,
            vector_store,
            shared_memory,
            semaphore,
            &Settings::default(),
            2,
        )
    }

    fn task() -> SubagentTask {
        SubagentTask::new(
            SpecialistType::Conceptual,
            vec!["conceptual".to_string()],
            vec!["raft".to_string()],
            String::new(),
            vec![],
            0.5,
            5,
            research_core::Priority::High,
            false,
        )
    }

    #[tokio::test]
    async fn completes_with_relevant_sources() {
        let agent = subagent(vec![page(0.9), page(0.85)]);
        let result = agent.run("what is raft?", task()).await;
        assert_eq!(result.status, RunStatus::Completed);
        assert!(!result.sources_used.is_empty());
        assert!(result.confidence > 0.0);
    }

    #[tokio::test]
    async fn open_circuit_breaker_short_circuits_run() {
        let agent = subagent(vec![page(0.9)]);
        for _ in 0..10 {
            agent.circuit_breaker.record_failure();
        }
        let result = agent.run("what is raft?", task()).await;
        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.failure_reason.as_deref(), Some("circuit breaker"));
    }
}
