//! `ConflictResolver`: detects and resolves disagreements between
//! specialist findings before synthesis (§4.7).

use std::sync::Arc;

use serde::Deserialize;

use research_core::{ChatMessage, ChatParams, LanguageModel, SpecialistType, SubagentResult};

const COMPARISON_CONTENT_CHARS: usize = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Factual,
    Emphasis,
    Perspective,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DecodedKind {
    NoConflict,
    Factual,
    Emphasis,
    Perspective,
}

#[derive(Debug, Deserialize)]
struct ConflictDecision {
    kind: DecodedKind,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Clone)]
pub struct Conflict {
    pub specialist_a: SpecialistType,
    pub specialist_b: SpecialistType,
    pub kind: ConflictKind,
    pub explanation: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedConflict {
    pub conflict: Conflict,
    pub resolution: String,
}

pub struct ConflictResolver {
    llm: Arc<dyn LanguageModel>,
    model: String,
}

impl ConflictResolver {
    pub fn new(llm: Arc<dyn LanguageModel>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }

    pub async fn identify(&self, results: &[SubagentResult]) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for i in 0..results.len() {
            for j in (i + 1)..results.len() {
                if let Some(conflict) = self.compare_pair(&results[i], &results[j]).await {
                    conflicts.push(conflict);
                }
            }
        }
        conflicts
    }

    async fn compare_pair(&self, a: &SubagentResult, b: &SubagentResult) -> Option<Conflict> {
        if a.status != research_core::RunStatus::Completed || b.status != research_core::RunStatus::Completed {
            return None;
        }

        let content_a: String = a.extracted_information.chars().take(COMPARISON_CONTENT_CHARS).collect();
        let content_b: String = b.extracted_information.chars().take(COMPARISON_CONTENT_CHARS).collect();

        let prompt = format!(
            "Compare these two research findings on the same query from different specialists.\n\n\
             SPECIALIST A ({}): {content_a}\n\n\
             SPECIALIST B ({}): {content_b}\n\n\
             Respond with exactly one JSON object on a single line: \
             {{\"kind\": \"no_conflict\"|\"factual\"|\"emphasis\"|\"perspective\", \"explanation\": \"...\"}}. \
             Use \"no_conflict\" with an empty explanation if they do not conflict.",
            a.specialist_type.as_str(),
            b.specialist_type.as_str()
        );

        let result = self
            .llm
            .chat(
                &self.model,
                &[ChatMessage::user(prompt)],
                ChatParams {
                    max_tokens: 120,
                    temperature: 0.0,
                },
            )
            .await;

        match result {
            Ok(text) => parse_conflict(&text, a.specialist_type, b.specialist_type),
            Err(_) => None,
        }
    }

    /// Resolution strategy: large confidence gaps defer to the more
    /// confident specialist; otherwise resolution is keyed by type.
    pub fn resolve(&self, conflicts: &[Conflict], results: &[SubagentResult]) -> Vec<ResolvedConflict> {
        conflicts
            .iter()
            .map(|conflict| {
                let conf_a = confidence_of(results, conflict.specialist_a);
                let conf_b = confidence_of(results, conflict.specialist_b);
                let resolution = if (conf_a - conf_b).abs() > 0.2 {
                    let winner = if conf_a > conf_b { conflict.specialist_a } else { conflict.specialist_b };
                    format!("prefer {} (higher confidence)", winner.as_str())
                } else {
                    match conflict.kind {
                        ConflictKind::Factual => "present both with caveats".to_string(),
                        ConflictKind::Emphasis => "integrate complementary".to_string(),
                        ConflictKind::Perspective => "present as alternative views".to_string(),
                    }
                };
                ResolvedConflict { conflict: conflict.clone(), resolution }
            })
            .collect()
    }
}

fn confidence_of(results: &[SubagentResult], specialist: SpecialistType) -> f32 {
    results
        .iter()
        .find(|r| r.specialist_type == specialist)
        .map(|r| r.confidence)
        .unwrap_or(0.0)
}

/// Strict typed decode of the LLM's conflict classification, with a
/// heuristic fallback to `NoConflict` on malformed output.
fn parse_conflict(text: &str, a: SpecialistType, b: SpecialistType) -> Option<Conflict> {
    let json_line = text.trim().lines().find(|l| l.trim_start().starts_with('{')).unwrap_or(text.trim());
    let decision: ConflictDecision = serde_json::from_str(json_line).ok()?;

    let kind = match decision.kind {
        DecodedKind::NoConflict => return None,
        DecodedKind::Factual => ConflictKind::Factual,
        DecodedKind::Emphasis => ConflictKind::Emphasis,
        DecodedKind::Perspective => ConflictKind::Perspective,
    };

    Some(Conflict { specialist_a: a, specialist_b: b, kind, explanation: decision.explanation })
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_llm::MockLanguageModel;
    use research_core::{Priority, RunStatus, SubagentTask};
    use std::time::Duration;

    fn result(specialist: SpecialistType, confidence: f32, info: &str) -> SubagentResult {
        SubagentResult {
            specialist_type: specialist,
            final_task: SubagentTask::new(specialist, vec![], vec![], String::new(), vec![], 0.6, 5, Priority::High, false),
            final_evaluation: None,
            extracted_information: info.to_string(),
            confidence,
            sources_used: vec![],
            iterations_performed: 1,
            processing_time: Duration::from_secs(1),
            status: RunStatus::Completed,
            failure_reason: None,
        }
    }

    #[tokio::test]
    async fn no_conflict_by_default_mock_response() {
        let resolver = ConflictResolver::new(Arc::new(MockLanguageModel::new()), "test-model");
        let results = vec![
            result(SpecialistType::Conceptual, 0.8, "raft uses leader election"),
            result(SpecialistType::Technical, 0.8, "raft implements log replication"),
        ];
        let conflicts = resolver.identify(&results).await;
        assert!(conflicts.is_empty());
    }

    #[test]
    fn large_confidence_gap_prefers_higher_confidence() {
        let resolver = ConflictResolver::new(Arc::new(MockLanguageModel::new()), "test-model");
        let results = vec![result(SpecialistType::Conceptual, 0.9, ""), result(SpecialistType::Technical, 0.5, "")];
        let conflicts = vec![Conflict {
            specialist_a: SpecialistType::Conceptual,
            specialist_b: SpecialistType::Technical,
            kind: ConflictKind::Factual,
            explanation: "disagreement".to_string(),
        }];
        let resolved = resolver.resolve(&conflicts, &results);
        assert!(resolved[0].resolution.contains("conceptual"));
    }

    #[test]
    fn small_confidence_gap_resolves_by_type() {
        let resolver = ConflictResolver::new(Arc::new(MockLanguageModel::new()), "test-model");
        let results = vec![result(SpecialistType::Conceptual, 0.8, ""), result(SpecialistType::Technical, 0.75, "")];
        let conflicts = vec![Conflict {
            specialist_a: SpecialistType::Conceptual,
            specialist_b: SpecialistType::Technical,
            kind: ConflictKind::Emphasis,
            explanation: "different focus".to_string(),
        }];
        let resolved = resolver.resolve(&conflicts, &results);
        assert_eq!(resolved[0].resolution, "integrate complementary");
    }
}
