//! `Synthesizer`: combines subagent findings, conflict resolutions,
//! and quality scoring into the final answer (§4.9).

use std::sync::Arc;
use std::time::Instant;

use research_core::{
    ChatMessage, ChatParams, Decomposition, FinalResult, LanguageModel, RunStatus, SubagentResult,
};

use crate::conflict_resolver::{ConflictResolver, ResolvedConflict};
use crate::quality_assessor::QualityAssessor;

pub struct Synthesizer {
    llm: Arc<dyn LanguageModel>,
    coordinator_model: String,
    conflict_resolver: ConflictResolver,
    quality_assessor: QualityAssessor,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>, subagent_model: impl Into<String>, coordinator_model: impl Into<String>) -> Self {
        let coordinator_model = coordinator_model.into();
        let conflict_resolver = ConflictResolver::new(llm.clone(), subagent_model.into());
        let quality_assessor = QualityAssessor::new(llm.clone(), coordinator_model.clone());
        Self {
            llm,
            coordinator_model,
            conflict_resolver,
            quality_assessor,
        }
    }

    pub async fn synthesize(&self, decomposition: &Decomposition, results: Vec<SubagentResult>) -> FinalResult {
        let start = Instant::now();

        let conflicts = self.conflict_resolver.identify(&results).await;
        let resolved = self.conflict_resolver.resolve(&conflicts, &results);

        let final_answer = self.coordinated_synthesis(decomposition, &results, &resolved).await;

        let completed: Vec<&SubagentResult> = results.iter().filter(|r| r.status == RunStatus::Completed).collect();
        let (weighted_sum, weight_sum) = completed.iter().fold((0.0_f32, 0.0_f32), |(ws, w), r| {
            let weight = (r.sources_used.len() as f32).max(1.0);
            (ws + r.confidence * weight, w + weight)
        });
        let confidence = if weight_sum > 0.0 { weighted_sum / weight_sum } else { 0.0 };

        let sources_cited = FinalResult::build_sources_cited(&results, |page| {
            results
                .iter()
                .filter_map(|r| r.final_evaluation.as_ref())
                .flat_map(|e| e.doc_evals.iter())
                .find(|d| d.page.key() == page.key())
                .map(|d| d.quality_score)
                .unwrap_or(page.similarity_score)
        });

        let reasoning_trace = build_reasoning_trace(decomposition, &results, &conflicts, &resolved);
        let quality_metrics = self
            .quality_assessor
            .assess(&decomposition.original_query, &final_answer, &results, decomposition)
            .await;

        let status = if completed.is_empty() { RunStatus::Failed } else { RunStatus::Completed };

        FinalResult {
            original_query: decomposition.original_query.clone(),
            decomposition: decomposition.clone(),
            subagent_results: results,
            synthesis_instructions: decomposition.synthesis_instructions.approach.clone(),
            final_answer,
            confidence,
            sources_cited,
            quality_metrics,
            reasoning_trace,
            total_processing_time: start.elapsed(),
            status,
            enhanced: true,
            error: None,
        }
    }

    async fn coordinated_synthesis(
        &self,
        decomposition: &Decomposition,
        results: &[SubagentResult],
        resolved: &[ResolvedConflict],
    ) -> String {
        let completed: Vec<&SubagentResult> = results.iter().filter(|r| r.status == RunStatus::Completed).collect();
        if completed.is_empty() {
            return "No specialist was able to retrieve relevant information for this query.".to_string();
        }

        let specialist_summaries: String = completed
            .iter()
            .map(|r| format!("[{} | confidence {:.2}]: {}", r.specialist_type.as_str(), r.confidence, r.extracted_information))
            .collect::<Vec<_>>()
            .join("\n\n");

        let conflict_summary = if resolved.is_empty() {
            "No conflicts detected between specialists.".to_string()
        } else {
            resolved
                .iter()
                .map(|rc| format!("{:?} conflict between {} and {}: {}", rc.conflict.kind, rc.conflict.specialist_a.as_str(), rc.conflict.specialist_b.as_str(), rc.resolution))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let prompt = format!(
            "Synthesize a final answer to the research query from these specialist findings.\n\n\
             QUERY: \"{}\"\n\n\
             INTEGRATION STRATEGY: {}\n\n\
             SPECIALIST FINDINGS:\n{specialist_summaries}\n\n\
             CONFLICT RESOLUTIONS:\n{conflict_summary}\n\n\
             Write a coherent, well-cited answer. Cite documents by name when referencing specific claims.",
            decomposition.original_query, decomposition.synthesis_instructions.integration_strategy,
        );

        let result = self
            .llm
            .chat(
                &self.coordinator_model,
                &[ChatMessage::user(prompt)],
                ChatParams {
                    max_tokens: 1024,
                    temperature: 0.3,
                },
            )
            .await;

        match result {
            Ok(text) if !text.trim().is_empty() => text,
            _ => fallback_concatenation(&completed),
        }
    }
}

fn fallback_concatenation(completed: &[&SubagentResult]) -> String {
    let mut answer = String::from("Synthesis via direct LLM call failed; presenting specialist findings directly.\n\n");
    for result in completed {
        answer.push_str(&format!("## {}\n{}\n\n", result.specialist_type.as_str(), result.extracted_information));
    }
    answer
}

fn build_reasoning_trace(
    decomposition: &Decomposition,
    results: &[SubagentResult],
    conflicts: &[crate::conflict_resolver::Conflict],
    resolved: &[ResolvedConflict],
) -> Vec<String> {
    let mut trace = Vec::new();
    trace.push(format!(
        "Decomposed query into {} task(s) under {:?} strategy ({:?} complexity).",
        decomposition.subagent_tasks.len(),
        decomposition.strategy,
        decomposition.complexity
    ));

    for result in results {
        match result.status {
            RunStatus::Completed => trace.push(format!(
                "{} specialist completed with confidence {:.2} across {} iteration(s).",
                result.specialist_type.as_str(),
                result.confidence,
                result.iterations_performed
            )),
            RunStatus::Failed => trace.push(format!(
                "{} specialist failed: {}.",
                result.specialist_type.as_str(),
                result.failure_reason.clone().unwrap_or_default()
            )),
        }
    }

    if conflicts.is_empty() {
        trace.push("No conflicts detected between specialist findings.".to_string());
    } else {
        trace.push(format!("{} conflict(s) identified and resolved.", conflicts.len()));
        for rc in resolved {
            trace.push(format!("Resolved via: {}.", rc.resolution));
        }
    }

    trace.push("Final answer synthesized from specialist findings.".to_string());
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_llm::MockLanguageModel;
    use research_core::{Complexity, Priority, SpecialistType, Strategy, SubagentTask, SynthesisInstructions};
    use std::time::Duration;

    fn decomposition() -> Decomposition {
        Decomposition {
            original_query: "what is raft?".to_string(),
            refined_query: "what is raft?".to_string(),
            complexity: Complexity::Simple,
            strategy: Strategy::DirectSearch,
            key_aspects: vec!["raft".to_string()],
            subagent_tasks: vec![],
            synthesis_instructions: SynthesisInstructions {
                approach: "simple synthesis".to_string(),
                priority_aspects: vec![],
                integration_strategy: "present directly".to_string(),
                conflict_resolution: String::new(),
                output_format: String::new(),
                quality_checks: vec![],
                citation_requirements: String::new(),
            },
            quality_criteria: vec![],
            fallback_strategy: String::new(),
        }
    }

    fn result(confidence: f32, status: RunStatus) -> SubagentResult {
        SubagentResult {
            specialist_type: SpecialistType::Conceptual,
            final_task: SubagentTask::new(SpecialistType::Conceptual, vec![], vec![], String::new(), vec![], 0.6, 5, Priority::High, false),
            final_evaluation: None,
            extracted_information: "raft elects a leader via randomized timeouts".to_string(),
            confidence,
            sources_used: vec![],
            iterations_performed: 1,
            processing_time: Duration::from_secs(1),
            status,
            failure_reason: if status == RunStatus::Failed { Some("timeout".to_string()) } else { None },
        }
    }

    #[tokio::test]
    async fn synthesis_completes_with_one_successful_specialist() {
        let synthesizer = Synthesizer::new(Arc::new(MockLanguageModel::new()), "sub-model", "coord-model");
        let final_result = synthesizer.synthesize(&decomposition(), vec![result(0.8, RunStatus::Completed)]).await;
        assert_eq!(final_result.status, RunStatus::Completed);
        assert!(!final_result.final_answer.is_empty());
    }

    #[tokio::test]
    async fn all_failed_specialists_yield_failed_status() {
        let synthesizer = Synthesizer::new(Arc::new(MockLanguageModel::new()), "sub-model", "coord-model");
        let final_result = synthesizer.synthesize(&decomposition(), vec![result(0.0, RunStatus::Failed)]).await;
        assert_eq!(final_result.status, RunStatus::Failed);
    }
}
