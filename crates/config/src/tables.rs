//! Closed lookup tables consulted by the Decomposer and QueryAnalyzer:
//! specialist keyword/focus-area sets and per-(complexity, specialist)
//! threshold/candidate defaults.
//!
//! The concrete numeric defaults here are not present verbatim in any
//! retrieved source (the original `enhanced_config.py` this was
//! distilled from ships stripped of its constant values) — they are a
//! conservative, monotonic-by-complexity design decision, recorded in
//! DESIGN.md.

use research_core::{Complexity, SpecialistType};

/// Specialist -> keyword set consulted by `determine_specialists` and
/// by `_generate_keywords` for building `search_keywords`.
pub fn specialist_keywords(specialist: SpecialistType) -> &'static [&'static str] {
    match specialist {
        SpecialistType::Conceptual => &["what is", "define", "concept", "theory", "principle"],
        SpecialistType::Comparative => &["compare", "versus", "vs", "difference", "alternative"],
        SpecialistType::Technical => &["how to", "implement", "architecture", "algorithm", "technical"],
        SpecialistType::Examples => &["example", "case study", "use case", "application"],
        SpecialistType::General => &["overview", "introduction", "general"],
    }
}

/// Specialist -> focus-area triple (the specialist's own name first),
/// used as the base of `SubagentTask.focus_areas`.
pub fn specialist_focus_areas(specialist: SpecialistType) -> &'static [&'static str] {
    match specialist {
        SpecialistType::Conceptual => &["conceptual", "definitions", "theoretical_background"],
        SpecialistType::Comparative => &["comparative", "alternatives", "differences"],
        SpecialistType::Technical => &["technical", "architecture", "implementation"],
        SpecialistType::Examples => &["examples", "case_studies", "applications"],
        SpecialistType::General => &["general", "overview", "broad_context"],
    }
}

/// Domain words each specialist prepends before planning a search.
/// Mirrors [`research_core::SpecialistType::plan_prefix`] — kept here
/// too since it is, structurally, a lookup table the Decomposer reads
/// alongside the others.
pub fn specialist_search_prefix(specialist: SpecialistType) -> Option<&'static str> {
    specialist.plan_prefix()
}

/// Default similarity threshold for a complexity tier, before any
/// specialist-specific override.
pub fn default_similarity_threshold(complexity: Complexity) -> f32 {
    match complexity {
        Complexity::Simple => 0.75,
        Complexity::Moderate => 0.65,
        Complexity::Complex => 0.6,
        Complexity::VeryComplex => 0.55,
    }
}

/// Default max-candidates for a complexity tier, before any
/// specialist-specific override.
pub fn default_max_candidates(complexity: Complexity) -> usize {
    match complexity {
        Complexity::Simple => 3,
        Complexity::Moderate => 5,
        Complexity::Complex => 8,
        Complexity::VeryComplex => 10,
    }
}

/// Specialist-specific threshold override, consulted before falling
/// back to [`default_similarity_threshold`]. Technical queries need
/// tighter precision; general queries can tolerate a looser match.
pub fn specialist_default_threshold(specialist: SpecialistType) -> Option<f32> {
    match specialist {
        SpecialistType::Technical => Some(0.7),
        SpecialistType::General => Some(0.55),
        _ => None,
    }
}

/// Specialist-specific candidate-count override, consulted before
/// falling back to [`default_max_candidates`].
pub fn specialist_default_max_candidates(specialist: SpecialistType) -> Option<usize> {
    match specialist {
        SpecialistType::Comparative => Some(8),
        SpecialistType::Examples => Some(6),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_stay_in_invariant_range() {
        for c in [
            Complexity::Simple,
            Complexity::Moderate,
            Complexity::Complex,
            Complexity::VeryComplex,
        ] {
            let t = default_similarity_threshold(c);
            assert!((0.3..=0.9).contains(&t));
        }
        for s in SpecialistType::ALL {
            if let Some(t) = specialist_default_threshold(s) {
                assert!((0.3..=0.9).contains(&t));
            }
        }
    }

    #[test]
    fn candidates_stay_in_invariant_range() {
        for c in [
            Complexity::Simple,
            Complexity::Moderate,
            Complexity::Complex,
            Complexity::VeryComplex,
        ] {
            let n = default_max_candidates(c);
            assert!((3..=15).contains(&n));
        }
    }
}
