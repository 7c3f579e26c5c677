//! Configuration management for the research orchestrator
//!
//! Supports loading configuration from:
//! - TOML/YAML files
//! - Environment variables (`RESEARCH_` prefix)
//! - Runtime overrides
//!
//! The closed lookup tables consulted by the Decomposer and QueryAnalyzer
//! (complexity -> subagent count, specialist keyword/focus-area sets,
//! per-(complexity, specialist) threshold/candidate overrides) live in
//! [`tables`].

pub mod settings;
pub mod tables;

pub use settings::{
    load_settings, CacheConfig, CircuitBreakerConfig, ConcurrencyConfig, FeatureFlags,
    LlmSettings, ModelConfig, ObservabilityConfig, RetryConfig, RuntimeEnvironment, Settings,
    TaskConfigOverrides, VectorStoreSettings,
};
pub use tables::{
    default_max_candidates, default_similarity_threshold, specialist_default_max_candidates,
    specialist_default_threshold, specialist_focus_areas, specialist_keywords,
    specialist_search_prefix,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
