//! Multi-agent research orchestration over page-level multimodal PDF
//! embeddings.
//!
//! - [`query_analyzer`] — complexity classification, specialist
//!   selection, key-aspect extraction (§4.1).
//! - [`decomposer`] — turns a query into a [`research_core::Decomposition`] (§4.2).
//! - [`subagent`] — the search-evaluate-refine execution envelope (§4.3).
//! - [`circuit_breaker`] / [`retrier`] — per-subagent resilience (§4.4/§4.5).
//! - [`shared_memory`] — cross-subagent discovery sharing and result cache (§4.6).
//! - [`conflict_resolver`] — detects and resolves cross-specialist disagreement (§4.7).
//! - [`quality_assessor`] — scores the synthesized answer (§4.8).
//! - [`synthesizer`] — combines subagent findings into the final answer (§4.9).
//! - [`lead_researcher`] — the public entry point (§4.10).

pub mod circuit_breaker;
pub mod conflict_resolver;
pub mod decomposer;
pub mod lead_researcher;
pub mod quality_assessor;
pub mod query_analyzer;
pub mod retrier;
pub mod shared_memory;
pub mod subagent;
pub mod synthesizer;

pub use circuit_breaker::CircuitBreaker;
pub use conflict_resolver::{Conflict, ConflictKind, ConflictResolver, ResolvedConflict};
pub use decomposer::Decomposer;
pub use lead_researcher::LeadResearcher;
pub use quality_assessor::QualityAssessor;
pub use query_analyzer::QueryAnalyzer;
pub use retrier::{BackoffStrategy, Retrier};
pub use shared_memory::SharedMemory;
pub use subagent::Subagent;
pub use synthesizer::Synthesizer;

use std::sync::Arc;

use research_config::Settings;
use research_core::{Complexity, Decomposition, FinalResult, LanguageModel, QualityMetrics, RunStatus, Strategy, SynthesisInstructions, VectorStoreClient};
use research_llm::{build_language_model, LlmProvider, MockLanguageModel};
use research_rag::QdrantVectorStore;

/// Wires concrete adapters and runs one research request end to end.
/// Used by `research-cli`; never returns an `Err` — construction
/// failures surface as a `Failed` `FinalResult`, consistent with the
/// rest of the pipeline's never-hard-fail contract.
pub async fn run_demo(settings: &Settings, query: &str, objective: Option<&str>) -> FinalResult {
    let llm = build_llm(settings);

    let vector_store: Arc<dyn VectorStoreClient> = match QdrantVectorStore::new(settings.vector_store.clone()) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::error!(%err, "failed to construct vector store client");
            return construction_failure(query, &err.to_string());
        }
    };

    let researcher = LeadResearcher::new(llm, vector_store, settings.clone());
    researcher.research(query, objective).await
}

fn build_llm(settings: &Settings) -> Arc<dyn LanguageModel> {
    let provider = if settings.llm.api_key.is_some() { LlmProvider::Claude } else { LlmProvider::Mock };
    match build_language_model(provider, settings.llm.api_key.as_deref(), settings.llm.endpoint.as_deref()) {
        Ok(model) => model,
        Err(err) => {
            tracing::warn!(%err, "falling back to the mock language model");
            Arc::new(MockLanguageModel::new())
        }
    }
}

fn construction_failure(query: &str, reason: &str) -> FinalResult {
    FinalResult {
        original_query: query.to_string(),
        decomposition: Decomposition {
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
        },
        subagent_results: vec![],
        synthesis_instructions: String::new(),
        final_answer: String::new(),
        confidence: 0.0,
        sources_cited: vec![],
        quality_metrics: QualityMetrics::new(0.0, 0.0, 0.0, 0.0, 0.0),
        reasoning_trace: vec![format!("setup failed: {reason}")],
        total_processing_time: std::time::Duration::ZERO,
        status: RunStatus::Failed,
        enhanced: false,
        error: Some(reason.to_string()),
    }
}
