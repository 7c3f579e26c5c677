//! `DocumentAnalyzer`: per-page relevance scoring and key-finding
//! extraction. Never fails outright — every LLM-backed step degrades
//! to a deterministic heuristic on error.

use std::sync::Arc;

use research_core::{ChatMessage, ChatParams, DocumentEvaluation, LanguageModel, PageRecord, Relevance};

const RELEVANCE_CONTENT_CHARS: usize = 2000;
const FINDINGS_CONTENT_CHARS: usize = 1500;

pub struct DocumentAnalyzer {
    llm: Arc<dyn LanguageModel>,
    model: String,
}

impl DocumentAnalyzer {
    pub fn new(llm: Arc<dyn LanguageModel>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    pub async fn evaluate(&self, page: &PageRecord, query: &str, focus_areas: &[String]) -> DocumentEvaluation {
        let relevance = self.assess_relevance(page, query, focus_areas).await;
        let key_findings = self.extract_key_findings(page, query).await;
        let coverage_areas = identify_coverage_areas(&page.markdown_text, focus_areas);
        let quality_score = quality_score(page, relevance);
        let extraction_summary =
            generate_extraction_summary(&key_findings, &coverage_areas, page.markdown_text.len());

        DocumentEvaluation {
            page: page.clone(),
            relevance,
            key_findings,
            coverage_areas,
            quality_score,
            extraction_summary,
        }
    }

    async fn assess_relevance(&self, page: &PageRecord, query: &str, focus_areas: &[String]) -> Relevance {
        let focus_context = if focus_areas.is_empty() {
            "general".to_string()
        } else {
            focus_areas.join(", ")
        };
        let content: String = page.markdown_text.chars().take(RELEVANCE_CONTENT_CHARS).collect();

        let prompt = format!(
            "Assess this document's relevance to the query.\n\n\
             QUERY: \"{query}\"\n\
             FOCUS AREAS: {focus_context}\n\n\
             DOCUMENT CONTENT:\n{content}\n\n\
             Classify the relevance as one of:\n\
             - HIGHLY_RELEVANT: directly answers the query\n\
             - RELEVANT: contains useful related information\n\
             - SOMEWHAT_RELEVANT: mentions the topic but is not central\n\
             - NOT_RELEVANT: unrelated\n\n\
             Respond with exactly one of: HIGHLY_RELEVANT, RELEVANT, SOMEWHAT_RELEVANT, NOT_RELEVANT"
        );

        let result = self
            .llm
            .chat(
                &self.model,
                &[ChatMessage::user(prompt)],
                ChatParams {
                    max_tokens: 16,
                    temperature: 0.0,
                },
            )
            .await;

        match result {
            Ok(text) => parse_relevance(&text).unwrap_or_else(|| Relevance::from_similarity(page.similarity_score)),
            Err(_) => Relevance::from_similarity(page.similarity_score),
        }
    }

    async fn extract_key_findings(&self, page: &PageRecord, query: &str) -> Vec<String> {
        let content: String = page.markdown_text.chars().take(FINDINGS_CONTENT_CHARS).collect();
        let mut message = ChatMessage::user(format!(
            "Extract 3 to 5 key findings from this document that are relevant to the query.\n\n\
             QUERY: \"{query}\"\n\n\
             DOCUMENT:\n{content}\n\n\
             Respond with one finding per line, no numbering or bullets."
        ));
        if let Some(image) = page.image_bytes.as_ref() {
            use base64::Engine;
            message = message.with_image(base64::engine::general_purpose::STANDARD.encode(image));
        }

        let result = self
            .llm
            .chat(&self.model, &[message], ChatParams::default())
            .await;

        match result {
            Ok(text) => {
                let findings: Vec<String> = text
                    .lines()
                    .map(|l| l.trim().trim_start_matches(['-', '*', '•']).trim().to_string())
                    .filter(|l| !l.is_empty())
                    .take(5)
                    .collect();
                if findings.is_empty() {
                    vec![format!("Document contains information about: {query}")]
                } else {
                    findings
                }
            }
            Err(_) => vec![format!("Document contains information about: {query}")],
        }
    }
}

fn parse_relevance(text: &str) -> Option<Relevance> {
    let normalized = text.trim().to_uppercase();
    if normalized.contains("HIGHLY_RELEVANT") {
        Some(Relevance::HighlyRelevant)
    } else if normalized.contains("NOT_RELEVANT") {
        Some(Relevance::NotRelevant)
    } else if normalized.contains("SOMEWHAT_RELEVANT") {
        Some(Relevance::SomewhatRelevant)
    } else if normalized.contains("RELEVANT") {
        Some(Relevance::Relevant)
    } else {
        None
    }
}

/// A focus area is covered when at least half of its underscore-split
/// keywords appear in the (lowercased) document text.
fn identify_coverage_areas(markdown: &str, focus_areas: &[String]) -> Vec<String> {
    let lowered = markdown.to_lowercase();
    focus_areas
        .iter()
        .filter(|area| {
            let keywords: Vec<&str> = area.split('_').collect();
            if keywords.is_empty() {
                return false;
            }
            let hits = keywords.iter().filter(|k| lowered.contains(*k)).count();
            (hits as f32) / (keywords.len() as f32) >= 0.5
        })
        .cloned()
        .collect()
}

fn quality_score(page: &PageRecord, relevance: Relevance) -> f32 {
    let base = page.similarity_score * relevance.quality_multiplier();
    let length_bonus = (page.markdown_text.len() as f32 / 5000.0).min(0.1);
    (base + length_bonus).clamp(0.0, 1.0)
}

/// Cheap, deterministic (no LLM) summary sentence.
fn generate_extraction_summary(key_findings: &[String], coverage_areas: &[String], content_len: usize) -> String {
    format!(
        "Extracted {} finding(s) covering {} focus area(s) from {} characters of content.",
        key_findings.len(),
        coverage_areas.len(),
        content_len
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_llm::MockLanguageModel;

    fn page(similarity: f32, markdown: &str) -> PageRecord {
        PageRecord {
            doc_source: "doc.pdf".to_string(),
            page_num: 1,
            file_path: "doc.pdf#1".to_string(),
            markdown_text: markdown.to_string(),
            similarity_score: similarity,
            image_bytes: None,
        }
    }

    #[tokio::test]
    async fn falls_back_to_similarity_heuristic_on_llm_failure() {
        let analyzer = DocumentAnalyzer::new(Arc::new(MockLanguageModel::new()), "test-model");
        let p = page(0.9, "raft consensus protocol details");
        let eval = analyzer.evaluate(&p, "what is raft?", &["conceptual".to_string()]).await;
        assert_eq!(eval.relevance, Relevance::HighlyRelevant);
    }

    #[test]
    fn coverage_requires_half_of_keywords() {
        let areas = vec!["theoretical_background".to_string()];
        let covered = identify_coverage_areas("this page discusses an unrelated topic entirely", &areas);
        assert!(covered.is_empty());
        let covered = identify_coverage_areas("theoretical background explained in depth", &areas);
        assert_eq!(covered, areas);
    }

    #[test]
    fn quality_score_is_clamped() {
        let p = page(1.0, &"x".repeat(10_000));
        let score = quality_score(&p, Relevance::HighlyRelevant);
        assert!(score <= 1.0);
    }
}
