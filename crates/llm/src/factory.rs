//! Resolves a configured provider into a concrete [`LanguageModel`].

use std::sync::Arc;

use research_core::{Error, LanguageModel, Result};

use crate::{ClaudeBackend, ClaudeConfig, MockLanguageModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Claude,
    Mock,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "claude" | "anthropic" => Some(LlmProvider::Claude),
            "mock" => Some(LlmProvider::Mock),
            _ => None,
        }
    }
}

/// Build the backend named by `provider`, given API key/endpoint from
/// [`research_config::LlmSettings`].
pub fn build_language_model(
    provider: LlmProvider,
    api_key: Option<&str>,
    endpoint: Option<&str>,
) -> Result<Arc<dyn LanguageModel>> {
    match provider {
        LlmProvider::Claude => {
            let mut config = ClaudeConfig::new(api_key.unwrap_or_default());
            if let Some(endpoint) = endpoint {
                config = config.with_endpoint(endpoint);
            }
            let backend = ClaudeBackend::new(config)
                .map_err(|e| Error::Config(e.to_string()))?;
            Ok(Arc::new(backend))
        }
        LlmProvider::Mock => Ok(Arc::new(MockLanguageModel::new())),
    }
}
