//! `QualityAssessor`: scores a synthesized answer against the query,
//! the decomposition's key aspects, and the specialists' findings
//! (§4.8).

use std::sync::Arc;

use research_core::{ChatMessage, ChatParams, Decomposition, LanguageModel, QualityMetrics, SubagentResult};

const DEFAULT_RUBRIC_SCORE: f32 = 0.7;
const MIN_SENTENCE_WORDS: usize = 8;
const MAX_SENTENCE_WORDS: usize = 25;
const CONNECTIVES: &[&str] = &[
    "however", "therefore", "additionally", "furthermore", "in contrast", "as a result",
    "moreover", "consequently",
];

const RUBRIC_LEVELS: &[(&str, f32)] = &[
    ("EXCELLENT", 1.0),
    ("GOOD", 0.8),
    ("ADEQUATE", 0.6),
    ("FAIR", 0.4),
    ("POOR", 0.2),
    ("VERY_POOR", 0.0),
];

pub struct QualityAssessor {
    llm: Arc<dyn LanguageModel>,
    model: String,
}

impl QualityAssessor {
    pub fn new(llm: Arc<dyn LanguageModel>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }

    pub async fn assess(
        &self,
        query: &str,
        final_answer: &str,
        results: &[SubagentResult],
        decomposition: &Decomposition,
    ) -> QualityMetrics {
        let query_relevance = self.rubric_score(query, final_answer, "how well the answer addresses the query").await;
        let completeness = completeness(final_answer, &decomposition.key_aspects);
        let coherence = self
            .rubric_score(query, final_answer, "how coherent and well-integrated the answer's structure is")
            .await;
        let source_utilization = source_utilization(final_answer, results);
        let clarity = clarity(final_answer);

        QualityMetrics::new(query_relevance, completeness, coherence, source_utilization, clarity)
    }

    async fn rubric_score(&self, query: &str, answer: &str, dimension: &str) -> f32 {
        let prompt = format!(
            "Rate {dimension} on this 6-level rubric: EXCELLENT, GOOD, ADEQUATE, FAIR, POOR, VERY_POOR.\n\n\
             QUERY: \"{query}\"\n\nANSWER:\n{answer}\n\n\
             Respond with exactly one of the six labels."
        );

        let result = self
            .llm
            .chat(
                &self.model,
                &[ChatMessage::user(prompt)],
                ChatParams {
                    max_tokens: 8,
                    temperature: 0.0,
                },
            )
            .await;

        match result {
            Ok(text) => parse_rubric(&text).unwrap_or(DEFAULT_RUBRIC_SCORE),
            Err(_) => DEFAULT_RUBRIC_SCORE,
        }
    }
}

fn parse_rubric(text: &str) -> Option<f32> {
    let normalized = text.trim().to_uppercase();
    RUBRIC_LEVELS.iter().find(|(label, _)| normalized.contains(label)).map(|(_, score)| *score)
}

/// Fraction of key aspects whose underscore/space-split keyword set is
/// at least half present in the answer; 1.0 when there are none.
fn completeness(answer: &str, key_aspects: &[String]) -> f32 {
    if key_aspects.is_empty() {
        return 1.0;
    }
    let lowered = answer.to_lowercase();
    let covered = key_aspects
        .iter()
        .filter(|aspect| {
            let keywords: Vec<&str> = aspect.split(|c: char| c == '_' || c.is_whitespace()).filter(|k| !k.is_empty()).collect();
            if keywords.is_empty() {
                return false;
            }
            let hits = keywords.iter().filter(|k| lowered.contains(&k.to_lowercase())).count();
            (hits as f32) / (keywords.len() as f32) >= 0.5
        })
        .count();
    covered as f32 / key_aspects.len() as f32
}

/// Fraction of specialists whose first 20 informative (len > 3)
/// keywords each appear at least 3 times in the answer.
fn source_utilization(answer: &str, results: &[SubagentResult]) -> f32 {
    let completed: Vec<&SubagentResult> = results.iter().filter(|r| r.status == research_core::RunStatus::Completed).collect();
    if completed.is_empty() {
        return 0.0;
    }
    let lowered = answer.to_lowercase();
    let utilized = completed
        .iter()
        .filter(|r| {
            let keywords: Vec<&str> = r
                .final_task
                .search_keywords
                .iter()
                .map(|k| k.as_str())
                .filter(|k| k.len() > 3)
                .take(20)
                .collect();
            if keywords.is_empty() {
                return false;
            }
            keywords.iter().any(|kw| lowered.matches(&kw.to_lowercase()).count() >= 3)
        })
        .count();
    utilized as f32 / completed.len() as f32
}

fn clarity(answer: &str) -> f32 {
    let sentence_score = sentence_length_score(answer);
    let connective_score = connective_density_score(answer);
    (sentence_score + connective_score) / 2.0
}

fn sentence_length_score(answer: &str) -> f32 {
    let sentences: Vec<&str> = answer.split(['.', '!', '?']).filter(|s| !s.trim().is_empty()).collect();
    if sentences.is_empty() {
        return 0.6;
    }
    let scores: Vec<f32> = sentences
        .iter()
        .map(|s| {
            let words = s.split_whitespace().count();
            if (MIN_SENTENCE_WORDS..=MAX_SENTENCE_WORDS).contains(&words) {
                1.0
            } else {
                0.6
            }
        })
        .collect();
    scores.iter().sum::<f32>() / scores.len() as f32
}

fn connective_density_score(answer: &str) -> f32 {
    let lowered = answer.to_lowercase();
    let sentence_count = answer.split(['.', '!', '?']).filter(|s| !s.trim().is_empty()).count().max(1);
    let hits: usize = CONNECTIVES.iter().map(|c| lowered.matches(c).count()).sum();
    ((hits as f32) / (sentence_count as f32)).clamp(0.0, 1.0)
}
