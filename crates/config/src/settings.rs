//! Main settings module

use std::collections::HashMap;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub models: ModelConfig,

    #[serde(default)]
    pub concurrency: ConcurrencyConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub features: FeatureFlags,

    #[serde(default)]
    pub vector_store: VectorStoreSettings,

    #[serde(default)]
    pub llm: LlmSettings,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_concurrency()?;
        self.validate_retry()?;
        self.validate_circuit_breaker()?;
        Ok(())
    }

    fn validate_concurrency(&self) -> Result<(), ConfigError> {
        if self.concurrency.max_subagents == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency.max_subagents".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.concurrency.concurrency_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency.concurrency_limit".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.concurrency.subagent_timeout_s == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency.subagent_timeout_s".to_string(),
                message: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    fn validate_retry(&self) -> Result<(), ConfigError> {
        if self.retry.max_retries > 10 {
            tracing::warn!(
                "retry.max_retries ({}) is unusually high",
                self.retry.max_retries
            );
        }
        Ok(())
    }

    fn validate_circuit_breaker(&self) -> Result<(), ConfigError> {
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "circuit_breaker.failure_threshold".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Which model a given call site uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Smaller, cheaper model for per-subagent calls (planning,
    /// evaluation, refinement).
    #[serde(default = "default_subagent_model")]
    pub subagent_model: String,

    /// Larger model for final synthesis and LLM-assisted decomposition.
    #[serde(default = "default_coordinator_model")]
    pub coordinator_model: String,
}

fn default_subagent_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}
fn default_coordinator_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            subagent_model: default_subagent_model(),
            coordinator_model: default_coordinator_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    #[serde(default = "default_max_subagents")]
    pub max_subagents: usize,
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    #[serde(default = "default_subagent_timeout_s")]
    pub subagent_timeout_s: u64,
    #[serde(default = "default_true")]
    pub parallel_execution: bool,
}

fn default_max_subagents() -> usize {
    3
}
fn default_concurrency_limit() -> usize {
    4
}
fn default_subagent_timeout_s() -> u64 {
    60
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_subagents: default_max_subagents(),
            concurrency_limit: default_concurrency_limit(),
            subagent_timeout_s: default_subagent_timeout_s(),
            parallel_execution: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    3
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "default_cb_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_cb_timeout_s")]
    pub recovery_timeout_s: u64,
}

fn default_cb_threshold() -> u32 {
    5
}
fn default_cb_timeout_s() -> u64 {
    60
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_cb_threshold(),
            recovery_timeout_s: default_cb_timeout_s(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
    #[serde(default = "default_cache_ttl_s")]
    pub ttl_s: u64,
}

fn default_cache_max_size() -> usize {
    1000
}
fn default_cache_ttl_s() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_cache_max_size(),
            ttl_s: default_cache_ttl_s(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// If false, decomposition is purely heuristic/pattern-based; no
    /// LLM call for complexity/refinement fallback.
    #[serde(default = "default_true")]
    pub enable_llm_decomposition: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_llm_decomposition: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreSettings {
    #[serde(default = "default_vector_store_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_vector_store_collection")]
    pub collection: String,
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Multimodal embedding service endpoint (query text -> vector).
    #[serde(default = "default_embedding_endpoint")]
    pub embedding_endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub embedding_api_key: Option<String>,
}

fn default_vector_store_endpoint() -> String {
    "http://localhost:6334".to_string()
}
fn default_vector_store_collection() -> String {
    "research_pages".to_string()
}
fn default_embedding_dim() -> usize {
    1024
}
fn default_embedding_endpoint() -> String {
    "https://api.voyageai.com/v1/multimodalembeddings".to_string()
}
fn default_embedding_model() -> String {
    "voyage-multimodal-3".to_string()
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            endpoint: default_vector_store_endpoint(),
            collection: default_vector_store_collection(),
            embedding_dim: default_embedding_dim(),
            api_key: None,
            embedding_endpoint: default_embedding_endpoint(),
            embedding_model: default_embedding_model(),
            embedding_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Per-(complexity, specialist) threshold/candidate overrides read
/// from config files, layered over [`crate::tables`]'s compiled-in
/// defaults. Empty by default; a deployment can tune individual
/// cells without recompiling.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskConfigOverrides {
    #[serde(default)]
    pub similarity_threshold: HashMap<String, f32>,
    #[serde(default)]
    pub max_candidates: HashMap<String, usize>,
}

/// Load settings from files and environment.
///
/// Priority (highest to lowest):
/// 1. Environment variables (`RESEARCH_` prefix)
/// 2. `config/{env}.toml` (if env specified)
/// 3. `config/default.toml`
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("RESEARCH")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.concurrency.max_subagents, 3);
    }

    #[test]
    fn rejects_zero_max_subagents() {
        let mut settings = Settings::default();
        settings.concurrency.max_subagents = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_zero_circuit_breaker_threshold() {
        let mut settings = Settings::default();
        settings.circuit_breaker.failure_threshold = 0;
        assert!(settings.validate().is_err());
    }
}
