//! `QueryAnalyzer`: deterministic pattern classification with an LLM
//! fallback, for complexity and specialist selection.

use std::sync::Arc;

use research_core::{ChatMessage, ChatParams, Complexity, LanguageModel, SpecialistType};

const COMPLEXITY_PATTERNS: &[(Complexity, &[&str])] = &[
    (
        Complexity::Simple,
        &["what is", "define", "meaning of", "explain"],
    ),
    (
        Complexity::Moderate,
        &["how does", "why", "advantages", "disadvantages"],
    ),
    (
        Complexity::Complex,
        &["compare", "analyze", "evaluate", "assess"],
    ),
    (
        Complexity::VeryComplex,
        &["comprehensive analysis", "detailed comparison", "in-depth study"],
    ),
];

pub struct QueryAnalyzer {
    llm: Arc<dyn LanguageModel>,
    model: String,
}

impl QueryAnalyzer {
    pub fn new(llm: Arc<dyn LanguageModel>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    pub async fn classify_complexity(&self, query: &str) -> Complexity {
        let lowered = query.to_lowercase();
        for (complexity, patterns) in COMPLEXITY_PATTERNS {
            if patterns.iter().any(|p| lowered.contains(p)) {
                return *complexity;
            }
        }
        self.classify_complexity_via_llm(query).await
    }

    async fn classify_complexity_via_llm(&self, query: &str) -> Complexity {
        let prompt = format!(
            "Classify the complexity of this document-research query as exactly one of: \
             simple, moderate, complex, very_complex.\n\nQUERY: \"{query}\"\n\n\
             Respond with exactly one word."
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
            Ok(text) => text.trim().parse().unwrap_or_else(|_| word_count_heuristic(query)),
            Err(_) => word_count_heuristic(query),
        }
    }

    /// Pattern-match each specialist's keyword list, applying the
    /// complexity-specific size rule, capped at 3.
    pub fn determine_specialists(&self, query: &str, complexity: Complexity) -> Vec<SpecialistType> {
        let lowered = query.to_lowercase();
        let mut specialists: Vec<SpecialistType> = SpecialistType::ALL
            .into_iter()
            .filter(|s| *s != SpecialistType::General)
            .filter(|s| {
                research_config::specialist_keywords(*s)
                    .iter()
                    .any(|kw| lowered.contains(kw))
            })
            .collect();

        if specialists.is_empty() {
            specialists.push(SpecialistType::General);
        }

        if complexity == Complexity::Simple && specialists.len() > 1 {
            specialists.truncate(1);
        } else if complexity == Complexity::VeryComplex
            && specialists.len() == 1
            && specialists[0] != SpecialistType::General
        {
            specialists.push(SpecialistType::General);
        }

        specialists.truncate(3);
        specialists
    }

    pub async fn extract_key_aspects(&self, query: &str) -> Vec<String> {
        let prompt = format!(
            "Extract the key aspects of this document-research query.\n\n\
             QUERY: \"{query}\"\n\n\
             List the 3 to 5 most important aspects that should be investigated. \
             Each aspect should be specific and grounded in information documents \
             could contain.\n\nFormat: one aspect per line, no numbering."
        );

        let result = self
            .llm
            .chat(
                &self.model,
                &[ChatMessage::user(prompt)],
                ChatParams {
                    max_tokens: 200,
                    temperature: 0.1,
                },
            )
            .await;

        match result {
            Ok(text) => {
                let aspects: Vec<String> = text
                    .lines()
                    .map(|l| l.trim().trim_start_matches(['-', '*', '•']).trim().to_string())
                    .filter(|l| !l.is_empty())
                    .take(5)
                    .collect();
                if aspects.is_empty() {
                    vec![query.to_string()]
                } else {
                    aspects
                }
            }
            Err(_) => vec![query.to_string()],
        }
    }
}

fn word_count_heuristic(query: &str) -> Complexity {
    let words = query.split_whitespace().count();
    if words <= 5 {
        Complexity::Simple
    } else if words <= 10 {
        Complexity::Moderate
    } else if words <= 20 {
        Complexity::Complex
    } else {
        Complexity::VeryComplex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_llm::MockLanguageModel;

    fn analyzer() -> QueryAnalyzer {
        QueryAnalyzer::new(Arc::new(MockLanguageModel::new()), "test-model")
    }

    #[tokio::test]
    async fn classifies_simple_by_pattern() {
        let a = analyzer();
        assert_eq!(a.classify_complexity("what is raft?").await, Complexity::Simple);
    }

    #[tokio::test]
    async fn classifies_very_complex_by_pattern() {
        let a = analyzer();
        assert_eq!(
            a.classify_complexity("give me a comprehensive analysis of raft vs paxos").await,
            Complexity::VeryComplex
        );
    }

    #[tokio::test]
    async fn word_count_fallback_used_when_no_pattern_matches_and_llm_fails() {
        let a = analyzer();
        let long_query = "tell me everything about ".to_string() + &"distributed systems ".repeat(10);
        assert_eq!(a.classify_complexity(&long_query).await, Complexity::VeryComplex);
    }

    #[test]
    fn simple_complexity_keeps_only_first_specialist() {
        let a = analyzer();
        let specialists = a.determine_specialists("compare and define raft", Complexity::Simple);
        assert_eq!(specialists.len(), 1);
    }

    #[test]
    fn very_complex_appends_general_to_singleton() {
        let a = analyzer();
        let specialists = a.determine_specialists("define raft consensus", Complexity::VeryComplex);
        assert_eq!(specialists, vec![SpecialistType::Conceptual, SpecialistType::General]);
    }

    #[test]
    fn no_match_falls_back_to_general() {
        let a = analyzer();
        let specialists = a.determine_specialists("asdkj qwoeiu", Complexity::Moderate);
        assert_eq!(specialists, vec![SpecialistType::General]);
    }
}
