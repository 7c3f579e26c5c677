//! Query, complexity classification, and the closed specialist set.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sanitize::sanitize_query;

/// A sanitized user question. Construction is the only way to obtain
/// one, so a `Query` in hand has already passed length and denylist
/// checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query(String);

impl Query {
    pub const MIN_LEN: usize = 3;
    pub const MAX_LEN: usize = 1000;

    /// Trim, sanitize against the injection-pattern denylist, and
    /// enforce the length bounds.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let trimmed = raw.into().trim().to_string();
        if trimmed.chars().count() < Self::MIN_LEN {
            return Err(Error::Validation(format!(
                "query too short: {} chars (minimum {})",
                trimmed.chars().count(),
                Self::MIN_LEN
            )));
        }
        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(Error::Validation(format!(
                "query too long: {} chars (maximum {})",
                trimmed.chars().count(),
                Self::MAX_LEN
            )));
        }
        let sanitized = sanitize_query(&trimmed)?;
        Ok(Self(sanitized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Query complexity, derived once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
    VeryComplex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
            Complexity::VeryComplex => "very_complex",
        }
    }

    /// Number of subagents the Decomposer creates for this complexity
    /// (1 / 1 / 2 / 3).
    pub fn estimated_subagents(&self) -> usize {
        match self {
            Complexity::Simple => 1,
            Complexity::Moderate => 1,
            Complexity::Complex => 2,
            Complexity::VeryComplex => 3,
        }
    }

    /// Maximum search-refine iterations for a subagent (default 2; 1
    /// for simple, up to 3 for very_complex).
    pub fn max_iterations(&self) -> usize {
        match self {
            Complexity::Simple => 1,
            Complexity::Moderate => 2,
            Complexity::Complex => 2,
            Complexity::VeryComplex => 3,
        }
    }
}

impl std::str::FromStr for Complexity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(Complexity::Simple),
            "moderate" => Ok(Complexity::Moderate),
            "complex" => Ok(Complexity::Complex),
            "very_complex" | "very complex" | "verycomplex" => Ok(Complexity::VeryComplex),
            other => Err(Error::UpstreamPermanent(format!(
                "unrecognized complexity label: {other}"
            ))),
        }
    }
}

/// The closed set of research specialists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistType {
    Conceptual,
    Comparative,
    Technical,
    Examples,
    General,
}

impl SpecialistType {
    pub const ALL: [SpecialistType; 5] = [
        SpecialistType::Conceptual,
        SpecialistType::Comparative,
        SpecialistType::Technical,
        SpecialistType::Examples,
        SpecialistType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialistType::Conceptual => "conceptual",
            SpecialistType::Comparative => "comparative",
            SpecialistType::Technical => "technical",
            SpecialistType::Examples => "examples",
            SpecialistType::General => "general",
        }
    }

    /// The domain-word prefix each specialist prepends to the query
    /// before planning a search (§4.3).
    pub fn plan_prefix(&self) -> Option<&'static str> {
        match self {
            SpecialistType::Conceptual => Some("definition concepts fundamentals"),
            SpecialistType::Comparative => Some("compare alternatives differences"),
            SpecialistType::Technical => Some("technical implementation architecture"),
            SpecialistType::Examples => Some("examples use cases applications"),
            SpecialistType::General => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_short_query() {
        assert!(Query::new("hi").is_err());
    }

    #[test]
    fn rejects_too_long_query() {
        let long = "a".repeat(1001);
        assert!(Query::new(long).is_err());
    }

    #[test]
    fn trims_whitespace() {
        let q = Query::new("  what is gold?  ").unwrap();
        assert_eq!(q.as_str(), "what is gold?");
    }

    #[test]
    fn complexity_estimated_subagents_matches_table() {
        assert_eq!(Complexity::Simple.estimated_subagents(), 1);
        assert_eq!(Complexity::Moderate.estimated_subagents(), 1);
        assert_eq!(Complexity::Complex.estimated_subagents(), 2);
        assert_eq!(Complexity::VeryComplex.estimated_subagents(), 3);
    }

    #[test]
    fn complexity_roundtrips_through_str() {
        for c in [
            Complexity::Simple,
            Complexity::Moderate,
            Complexity::Complex,
            Complexity::VeryComplex,
        ] {
            let parsed: Complexity = c.as_str().parse().unwrap();
            assert_eq!(parsed, c);
        }
    }
}
