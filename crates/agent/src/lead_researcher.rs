//! `LeadResearcher`: the public entry point. Decomposes a query,
//! dispatches subagents, and synthesizes their results into a
//! `FinalResult` that never hard-fails the caller (§4.10).

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use research_config::Settings;
use research_core::{
    Complexity, Decomposition, Error, FinalResult, LanguageModel, Priority, Query, QualityMetrics,
    RunStatus, SpecialistType, Strategy, SubagentResult, SubagentTask, SynthesisInstructions,
    VectorStoreClient,
};
use research_rag::DocumentAnalyzer;

use crate::decomposer::Decomposer;
use crate::shared_memory::SharedMemory;
use crate::subagent::Subagent;
use crate::synthesizer::Synthesizer;

pub struct LeadResearcher {
    decomposer: Decomposer,
    synthesizer: Synthesizer,
    vector_store: Arc<dyn VectorStoreClient>,
    shared_memory: Arc<SharedMemory>,
    llm: Arc<dyn LanguageModel>,
    settings: Settings,
}

impl LeadResearcher {
    pub fn new(llm: Arc<dyn LanguageModel>, vector_store: Arc<dyn VectorStoreClient>, settings: Settings) -> Self {
        let decomposer = Decomposer::new(
            llm.clone(),
            settings.models.subagent_model.clone(),
            settings.models.coordinator_model.clone(),
            settings.features.enable_llm_decomposition,
        );
        let synthesizer = Synthesizer::new(llm.clone(), settings.models.subagent_model.clone(), settings.models.coordinator_model.clone());
        let shared_memory = Arc::new(SharedMemory::new(settings.cache));

        Self {
            decomposer,
            synthesizer,
            vector_store,
            shared_memory,
            llm,
            settings,
        }
    }

    pub async fn research(&self, query: &str, objective: Option<&str>) -> FinalResult {
        let start = Instant::now();

        let sanitized = match Query::new(query) {
            Ok(q) => q,
            Err(err) => return validation_failure(query, err, start.elapsed()),
        };

        let decomposition = self.decomposer.decompose(sanitized.as_str()).await;
        let refined_query = match objective {
            Some(obj) if !obj.trim().is_empty() => format!("{} (objective: {obj})", decomposition.refined_query),
            _ => decomposition.refined_query.clone(),
        };

        let results = self.run_subagents(&refined_query, &decomposition).await;

        let mut final_result = if results.iter().all(|r| r.status == RunStatus::Failed) {
            self.fallback(&decomposition, &refined_query).await
        } else {
            self.synthesizer.synthesize(&decomposition, results).await
        };

        final_result.total_processing_time = start.elapsed();
        final_result
    }

    async fn run_subagents(&self, refined_query: &str, decomposition: &Decomposition) -> Vec<SubagentResult> {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.concurrency_limit));
        let max_iterations = decomposition.complexity.max_iterations();

        if self.settings.concurrency.parallel_execution {
            let handles: Vec<_> = decomposition
                .subagent_tasks
                .iter()
                .enumerate()
                .map(|(idx, task)| {
                    let subagent = self.build_subagent(idx, task.specialist_type, semaphore.clone(), max_iterations);
                    let task = task.clone();
                    let query = refined_query.to_string();
                    tokio::spawn(async move { subagent.run(&query, task).await })
                })
                .collect();

            let mut results = Vec::with_capacity(handles.len());
            for handle in handles {
                if let Ok(result) = handle.await {
                    results.push(result);
                }
            }
            results
        } else {
            let mut results = Vec::with_capacity(decomposition.subagent_tasks.len());
            for (idx, task) in decomposition.subagent_tasks.iter().enumerate() {
                let subagent = self.build_subagent(idx, task.specialist_type, semaphore.clone(), max_iterations);
                results.push(subagent.run(refined_query, task.clone()).await);
            }
            results
        }
    }

    fn build_subagent(&self, idx: usize, specialist: SpecialistType, semaphore: Arc<Semaphore>, max_iterations: usize) -> Subagent {
        let document_analyzer = DocumentAnalyzer::new(self.llm.clone(), self.settings.models.subagent_model.clone());
        Subagent::new(
            format!("agent-{idx}"),
            specialist,
            document_analyzer,
            self.vector_store.clone(),
            self.shared_memory.clone(),
            semaphore,
            &self.settings,
            max_iterations,
        )
    }

    /// Degraded path: all primary specialists failed. Retry once with
    /// a single general specialist at a reduced threshold.
    async fn fallback(&self, decomposition: &Decomposition, refined_query: &str) -> FinalResult {
        let semaphore = Arc::new(Semaphore::new(1));
        let document_analyzer = DocumentAnalyzer::new(self.llm.clone(), self.settings.models.subagent_model.clone());
        let subagent = Subagent::new(
            "agent-fallback",
            SpecialistType::General,
            document_analyzer,
            self.vector_store.clone(),
            self.shared_memory.clone(),
            semaphore,
            &self.settings,
            1,
        );

        let reduced_threshold = (research_config::default_similarity_threshold(Complexity::Simple) - 0.1)
            .max(research_core::SIMILARITY_THRESHOLD_RANGE.0);
        let task = SubagentTask::new(
            SpecialistType::General,
            vec!["general".to_string(), "overview".to_string(), "broad_context".to_string()],
            vec![],
            decomposition.original_query.clone(),
            vec![],
            reduced_threshold,
            research_config::default_max_candidates(Complexity::Simple),
            Priority::High,
            false,
        );

        let result = subagent.run(refined_query, task).await;

        if result.status == RunStatus::Failed {
            return FinalResult {
                original_query: decomposition.original_query.clone(),
                decomposition: decomposition.clone(),
                subagent_results: vec![result],
                synthesis_instructions: decomposition.fallback_strategy.clone(),
                final_answer: String::new(),
                confidence: 0.0,
                sources_cited: vec![],
                quality_metrics: QualityMetrics::new(0.0, 0.0, 0.0, 0.0, 0.0),
                reasoning_trace: vec!["all specialists and the fallback strategy failed".to_string()],
                total_processing_time: Duration::ZERO,
                status: RunStatus::Failed,
                enhanced: false,
                error: Some("all subagents and the fallback strategy failed".to_string()),
            };
        }

        let mut final_result = self.synthesizer.synthesize(decomposition, vec![result]).await;
        final_result.enhanced = false;
        final_result
    }
}

fn validation_failure(query: &str, err: Error, elapsed: Duration) -> FinalResult {
    FinalResult {
        original_query: query.to_string(),
        decomposition: empty_decomposition(query),
        subagent_results: vec![],
        synthesis_instructions: String::new(),
        final_answer: String::new(),
        confidence: 0.0,
        sources_cited: vec![],
        quality_metrics: QualityMetrics::new(0.0, 0.0, 0.0, 0.0, 0.0),
        reasoning_trace: vec![format!("rejected: {err}")],
        total_processing_time: elapsed,
        status: RunStatus::Failed,
        enhanced: false,
        error: Some(err.to_string()),
    }
}

fn empty_decomposition(query: &str) -> Decomposition {
    Decomposition {
        original_query: query.to_string(),
        refined_query: query.to_string(),
        complexity: Complexity::Simple,
        strategy: Strategy::DirectSearch,
        key_aspects: vec![],
        subagent_tasks: vec![],
        synthesis_instructions: SynthesisInstructions {
            approach: String::new(),
            priority_aspects: vec![],
            integration_strategy: String::new(),
            conflict_resolution: String::new(),
            output_format: String::new(),
            quality_checks: vec![],
            citation_requirements: String::new(),
        },
        quality_criteria: vec![],
        fallback_strategy: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_core::{ChatMessage, ChatParams, PageRecord, Result};
    use research_llm::MockLanguageModel;

    struct StubVectorStore;

    #[async_trait::async_trait]
    impl VectorStoreClient for StubVectorStore {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.1, 0.2])
        }

        async fn search_top_k(&self, _embedding: &[f32], _limit: usize) -> Result<Vec<PageRecord>> {
            Ok(vec![PageRecord {
                doc_source: "raft.pdf".to_string(),
                page_num: 1,
                file_path: "raft.pdf#1".to_string(),
                markdown_text: "raft consensus leader election log replication".to_string(),
                similarity_score: 0.9,
                image_bytes: None,
            }])
        }
    }

    struct StubLlm;

    #[async_trait::async_trait]
    impl LanguageModel for StubLlm {
        async fn chat(&self, _model: &str, _messages: &[ChatMessage], _params: ChatParams) -> Result<String> {
            Ok("HIGHLY_RELEVANT".to_string())
        }
    }

    #[tokio::test]
    async fn rejects_invalid_query_without_panicking() {
        let researcher = LeadResearcher::new(Arc::new(MockLanguageModel::new()), Arc::new(StubVectorStore), Settings::default());
        let result = researcher.research("hi", None).await;
        assert_eq!(result.status, RunStatus::Failed);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn simple_query_produces_completed_result() {
        let researcher = LeadResearcher::new(Arc::new(StubLlm), Arc::new(StubVectorStore), Settings::default());
        let result = researcher.research("what is raft consensus?", None).await;
        assert_eq!(result.status, RunStatus::Completed);
        assert!(!result.final_answer.is_empty());
    }
}
