//! `Decomposer`: turns a sanitized query into a `Decomposition` — a
//! refined query, strategy, and one `SubagentTask` per selected
//! specialist (§4.2).

use std::sync::Arc;

use research_core::{
    ChatMessage, ChatParams, Complexity, Decomposition, LanguageModel, Priority, SpecialistType,
    Strategy, SubagentTask, SynthesisInstructions,
};

use crate::query_analyzer::QueryAnalyzer;

pub struct Decomposer {
    llm: Arc<dyn LanguageModel>,
    coordinator_model: String,
    analyzer: QueryAnalyzer,
    enable_llm_refinement: bool,
}

impl Decomposer {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        subagent_model: impl Into<String>,
        coordinator_model: impl Into<String>,
        enable_llm_refinement: bool,
    ) -> Self {
        let analyzer = QueryAnalyzer::new(llm.clone(), subagent_model);
        Self {
            llm,
            coordinator_model: coordinator_model.into(),
            analyzer,
            enable_llm_refinement,
        }
    }

    pub async fn decompose(&self, query: &str) -> Decomposition {
        let complexity = self.analyzer.classify_complexity(query).await;
        let specialists = self.analyzer.determine_specialists(query, complexity);
        let key_aspects = self.analyzer.extract_key_aspects(query).await;
        let refined_query = self.refine_query(query, &key_aspects).await;
        let strategy = Strategy::for_complexity(complexity);

        let subagent_tasks: Vec<SubagentTask> = specialists
            .iter()
            .enumerate()
            .map(|(idx, specialist)| build_task(query, *specialist, complexity, &key_aspects, idx == 0))
            .collect();

        let synthesis_instructions = build_synthesis_instructions(complexity, &specialists);
        let quality_criteria = build_quality_criteria(complexity);
        let fallback_strategy = build_fallback_strategy(complexity);

        Decomposition {
            original_query: query.to_string(),
            refined_query,
            complexity,
            strategy,
            key_aspects,
            subagent_tasks,
            synthesis_instructions,
            quality_criteria,
            fallback_strategy,
        }
    }

    /// Semantic expansion of the query via the coordinator model: adds
    /// synonyms and related phrasing, bounded to one short line. Falls
    /// back to the original query on failure or when disabled.
    async fn refine_query(&self, query: &str, key_aspects: &[String]) -> String {
        if !self.enable_llm_refinement {
            return query.to_string();
        }

        let aspects = key_aspects.join(", ");
        let prompt = format!(
            "Rewrite this research query into a single expanded search query that adds \
             relevant synonyms and related terminology, without changing its meaning.\n\n\
             QUERY: \"{query}\"\n\
             KEY ASPECTS: {aspects}\n\n\
             Respond with exactly one line: the expanded query, nothing else."
        );

        let result = self
            .llm
            .chat(
                &self.coordinator_model,
                &[ChatMessage::user(prompt)],
                ChatParams {
                    max_tokens: 120,
                    temperature: 0.2,
                },
            )
            .await;

        match result {
            Ok(text) => {
                let line = text.lines().next().unwrap_or("").trim();
                if line.is_empty() {
                    query.to_string()
                } else {
                    line.to_string()
                }
            }
            Err(_) => query.to_string(),
        }
    }
}

fn build_task(query: &str, specialist: SpecialistType, complexity: Complexity, key_aspects: &[String], is_first: bool) -> SubagentTask {
    let threshold = research_config::specialist_default_threshold(specialist)
        .unwrap_or_else(|| research_config::default_similarity_threshold(complexity));
    let max_candidates = research_config::specialist_default_max_candidates(specialist)
        .unwrap_or_else(|| research_config::default_max_candidates(complexity));

    let mut focus_areas: Vec<String> = research_config::specialist_focus_areas(specialist)
        .iter()
        .map(|s| s.to_string())
        .collect();
    let specialist_keywords = research_config::specialist_keywords(specialist);
    let matching_aspects: Vec<&String> = key_aspects
        .iter()
        .filter(|aspect| {
            let lowered = aspect.to_lowercase();
            specialist_keywords.iter().any(|kw| lowered.contains(kw))
        })
        .take(2)
        .collect();
    focus_areas.extend(matching_aspects.iter().map(|a| a.to_lowercase().replace(' ', "_")));

    let mut search_keywords: Vec<String> = vec![query.to_string()];
    search_keywords.extend(specialist_keywords.iter().map(|s| s.to_string()));
    for area in &focus_areas {
        search_keywords.extend(area.split('_').map(|s| s.to_string()));
    }
    search_keywords.extend(key_aspects.iter().cloned());

    let priority = if is_first { Priority::High } else { Priority::Medium };
    let iterative_refinement = complexity != Complexity::Simple;

    SubagentTask::new(
        specialist,
        focus_areas,
        search_keywords,
        key_aspects.join("; "),
        vec![],
        threshold,
        max_candidates,
        priority,
        iterative_refinement,
    )
}

fn build_synthesis_instructions(complexity: Complexity, specialists: &[SpecialistType]) -> SynthesisInstructions {
    let priority_aspects: Vec<String> = specialists.iter().map(|s| s.as_str().to_string()).collect();

    let integration_strategy = match complexity {
        Complexity::Simple => "present the single specialist's findings directly",
        Complexity::Moderate => "lead with the primary specialist, support with others",
        Complexity::Complex => "weave perspectives together, noting agreement and divergence",
        Complexity::VeryComplex => "structured multi-section synthesis covering every perspective",
    };

    SynthesisInstructions {
        approach: format!("{:?} complexity synthesis across {} specialist(s)", complexity, specialists.len()),
        priority_aspects,
        integration_strategy: integration_strategy.to_string(),
        conflict_resolution: "prefer higher-confidence specialist; else resolve by conflict type".to_string(),
        output_format: "structured prose with cited sources".to_string(),
        quality_checks: vec![
            "every claim traceable to a source".to_string(),
            "no unresolved direct contradictions".to_string(),
        ],
        citation_requirements: "cite document and page number for every factual claim".to_string(),
    }
}

fn build_quality_criteria(complexity: Complexity) -> Vec<String> {
    let mut criteria = vec![
        "direct relevance to the original query".to_string(),
        "source quality and reliability".to_string(),
        "coherence of integration across specialists".to_string(),
    ];

    if matches!(complexity, Complexity::Complex | Complexity::VeryComplex) {
        criteria.push("completeness of coverage across key aspects".to_string());
        criteria.push("balance of perspectives".to_string());
        criteria.push("resolution of conflicting information".to_string());
    }

    if complexity == Complexity::VeryComplex {
        criteria.push("critical analysis of limitations".to_string());
        criteria.push("methodological context".to_string());
    }

    criteria
}

fn build_fallback_strategy(complexity: Complexity) -> String {
    match complexity {
        Complexity::Simple => "lower similarity threshold and retry with a generic answer".to_string(),
        Complexity::Moderate => "retry with the general specialist only, reduced threshold".to_string(),
        Complexity::Complex | Complexity::VeryComplex => {
            "fall back to a single general specialist with comprehensive-coverage threshold".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_llm::MockLanguageModel;

    fn decomposer() -> Decomposer {
        Decomposer::new(Arc::new(MockLanguageModel::new()), "sub-model", "coord-model", true)
    }

    #[tokio::test]
    async fn simple_query_produces_single_task() {
        let d = decomposer();
        let decomposition = d.decompose("what is raft consensus?").await;
        assert_eq!(decomposition.complexity, Complexity::Simple);
        assert_eq!(decomposition.subagent_tasks.len(), 1);
        assert_eq!(decomposition.subagent_tasks[0].priority, Priority::High);
    }

    #[tokio::test]
    async fn complex_query_produces_multiple_tasks_with_valid_ranges() {
        let d = decomposer();
        let decomposition = d.decompose("compare the algorithm implementation versus alternative approaches").await;
        assert!(decomposition.subagent_tasks.len() >= 2);
        for task in &decomposition.subagent_tasks {
            assert!((0.3..=0.9).contains(&task.similarity_threshold));
            assert!((3..=15).contains(&task.max_candidates));
        }
    }

    #[tokio::test]
    async fn very_complex_query_includes_critical_analysis_criterion() {
        let d = decomposer();
        let decomposition = d
            .decompose("give me a comprehensive analysis of raft vs paxos with tradeoffs")
            .await;
        assert!(decomposition
            .quality_criteria
            .iter()
            .any(|c| c.contains("critical analysis")));
    }

    #[tokio::test]
    async fn disabled_refinement_keeps_original_query() {
        let d = Decomposer::new(Arc::new(MockLanguageModel::new()), "sub", "coord", false);
        let decomposition = d.decompose("what is raft?").await;
        assert_eq!(decomposition.refined_query, "what is raft?");
    }
}
