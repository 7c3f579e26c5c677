//! `LanguageModel` backends for the research orchestrator.
//!
//! - [`claude`] — Anthropic Messages API backend, the production path.
//! - [`mock`] — deterministic, scriptable backend for tests.
//! - [`factory`] — resolves `subagent_model` vs `coordinator_model`
//!   against a configured provider.

pub mod claude;
pub mod factory;
pub mod mock;

pub use claude::{ClaudeBackend, ClaudeConfig};
pub use factory::{build_language_model, LlmProvider};
pub use mock::MockLanguageModel;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for research_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => research_core::Error::Timeout(std::time::Duration::from_secs(0)),
            LlmError::Network(_) | LlmError::Api(_) => {
                research_core::Error::Transient(err.to_string())
            }
            other => research_core::Error::Llm(other.to_string()),
        }
    }
}
