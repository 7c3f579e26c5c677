//! `DocumentEvaluation` and `SearchEvaluation` — per-page and
//! per-iteration assessments produced by the RAG crate.

use serde::{Deserialize, Serialize};

use crate::page::PageRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    HighlyRelevant,
    Relevant,
    SomewhatRelevant,
    NotRelevant,
}

impl Relevance {
    /// Multiplier used in `DocumentAnalyzer`'s quality-score formula.
    pub fn quality_multiplier(&self) -> f32 {
        match self {
            Relevance::HighlyRelevant => 1.0,
            Relevance::Relevant => 0.8,
            Relevance::SomewhatRelevant => 0.6,
            Relevance::NotRelevant => 0.3,
        }
    }

    /// Weight used in `IterativeEvaluator`'s overall-relevance formula
    /// (distinct from the quality multiplier above).
    pub fn relevance_weight(&self) -> f32 {
        match self {
            Relevance::HighlyRelevant => 1.0,
            Relevance::Relevant => 0.8,
            Relevance::SomewhatRelevant => 0.5,
            Relevance::NotRelevant => 0.1,
        }
    }

    /// Heuristic fallback from a raw similarity score when the LLM
    /// relevance call fails (§4.4).
    pub fn from_similarity(score: f32) -> Self {
        if score > 0.8 {
            Relevance::HighlyRelevant
        } else if score > 0.6 {
            Relevance::Relevant
        } else if score > 0.4 {
            Relevance::SomewhatRelevant
        } else {
            Relevance::NotRelevant
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEvaluation {
    pub page: PageRecord,
    pub relevance: Relevance,
    pub key_findings: Vec<String>,
    pub coverage_areas: Vec<String>,
    pub quality_score: f32,
    pub extraction_summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEvaluation {
    pub doc_evals: Vec<DocumentEvaluation>,
    pub overall_relevance: f32,
    pub coverage_completeness: f32,
    pub gaps: Vec<String>,
    pub refinement_suggestions: Vec<String>,
    pub sufficient: bool,
    pub next_keywords: Vec<String>,
    pub synthesis_guidance: String,
}
