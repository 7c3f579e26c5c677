//! Decomposition output types produced by the Decomposer.

use serde::{Deserialize, Serialize};

use crate::query::{Complexity, SpecialistType};
use crate::task::SubagentTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    DirectSearch,
    SemanticExpansion,
    IterativeRefinement,
    MultiPerspective,
    ComprehensiveCoverage,
    FocusedDeepDive,
}

impl Strategy {
    /// The complexity → strategy keying from §4.2.
    pub fn for_complexity(complexity: Complexity) -> Self {
        match complexity {
            Complexity::Simple => Strategy::DirectSearch,
            Complexity::Moderate => Strategy::SemanticExpansion,
            Complexity::Complex => Strategy::MultiPerspective,
            Complexity::VeryComplex => Strategy::ComprehensiveCoverage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisInstructions {
    pub approach: String,
    pub priority_aspects: Vec<String>,
    pub integration_strategy: String,
    pub conflict_resolution: String,
    pub output_format: String,
    pub quality_checks: Vec<String>,
    pub citation_requirements: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decomposition {
    pub original_query: String,
    pub refined_query: String,
    pub complexity: Complexity,
    pub strategy: Strategy,
    pub key_aspects: Vec<String>,
    pub subagent_tasks: Vec<SubagentTask>,
    pub synthesis_instructions: SynthesisInstructions,
    pub quality_criteria: Vec<String>,
    pub fallback_strategy: String,
}

impl Decomposition {
    pub fn specialists_used(&self) -> Vec<SpecialistType> {
        self.subagent_tasks
            .iter()
            .map(|t| t.specialist_type)
            .collect()
    }
}
