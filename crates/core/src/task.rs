//! `SubagentTask` — the unit of work a Decomposer hands to a Subagent.

use serde::{Deserialize, Serialize};

use crate::query::SpecialistType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Bounds enforced on `SubagentTask` and every refined copy of it.
pub const SIMILARITY_THRESHOLD_RANGE: (f32, f32) = (0.3, 0.9);
pub const MAX_CANDIDATES_RANGE: (usize, usize) = (3, 15);
pub const MAX_KEYWORDS: usize = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubagentTask {
    pub specialist_type: SpecialistType,
    pub focus_areas: Vec<String>,
    pub search_keywords: Vec<String>,
    pub semantic_context: String,
    pub expected_findings: Vec<String>,
    pub similarity_threshold: f32,
    pub max_candidates: usize,
    pub priority: Priority,
    pub iterative_refinement: bool,
}

impl SubagentTask {
    /// Clamp threshold/candidates into their spec'd ranges and dedupe
    /// keywords, capped at 10 (the Decomposer's construction cap) —
    /// called once at construction time.
    pub fn new(
        specialist_type: SpecialistType,
        focus_areas: Vec<String>,
        mut search_keywords: Vec<String>,
        semantic_context: String,
        expected_findings: Vec<String>,
        similarity_threshold: f32,
        max_candidates: usize,
        priority: Priority,
        iterative_refinement: bool,
    ) -> Self {
        dedupe_in_place(&mut search_keywords);
        search_keywords.truncate(10);
        Self {
            specialist_type,
            focus_areas,
            search_keywords,
            semantic_context,
            expected_findings,
            similarity_threshold: similarity_threshold
                .clamp(SIMILARITY_THRESHOLD_RANGE.0, SIMILARITY_THRESHOLD_RANGE.1),
            max_candidates: max_candidates.clamp(MAX_CANDIDATES_RANGE.0, MAX_CANDIDATES_RANGE.1),
            priority,
            iterative_refinement,
        }
    }
}

fn dedupe_in_place(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_threshold_into_range() {
        let task = SubagentTask::new(
            SpecialistType::General,
            vec![],
            vec![],
            String::new(),
            vec![],
            1.5,
            2,
            Priority::High,
            false,
        );
        assert!((task.similarity_threshold - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn dedupes_keywords() {
        let task = SubagentTask::new(
            SpecialistType::General,
            vec![],
            vec!["a".into(), "a".into(), "b".into()],
            String::new(),
            vec![],
            0.5,
            5,
            Priority::Medium,
            false,
        );
        assert_eq!(task.search_keywords, vec!["a".to_string(), "b".to_string()]);
    }
}
