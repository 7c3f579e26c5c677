//! Error taxonomy for the research orchestrator
//!
//! Every error resolves to one of the five categories in the error
//! handling design: validation, transient, upstream-permanent,
//! exhausted, or fatal. `is_retryable` is the typed replacement for the
//! original implementation's substring matching on error messages.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("transient error: {0}")]
    Transient(String),

    #[error("upstream permanent error: {0}")]
    UpstreamPermanent(String),

    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("vector store error: {0}")]
    VectorStore(String),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("circuit breaker open")]
    CircuitBreakerOpen,

    #[error("timeout after {0:?}")]
    Timeout(std::time::Duration),
}

impl Error {
    /// Whether a failed attempt carrying this error should be retried.
    ///
    /// Transient errors and timeouts are retryable; everything else
    /// (validation, upstream-permanent, fatal, exhausted, breaker-open)
    /// is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient(_) | Error::Timeout(_))
    }

    /// Classify a raw upstream error message into a typed transient/
    /// permanent error using the keyword list from the error handling
    /// design (timeout, connection, rate limit, temporary, unavailable,
    /// too many requests, network).
    pub fn classify_upstream(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        const RETRYABLE_MARKERS: &[&str] = &[
            "timeout",
            "connection",
            "rate limit",
            "temporary",
            "unavailable",
            "too many requests",
            "network",
        ];
        if RETRYABLE_MARKERS.iter().any(|m| lowered.contains(m)) {
            Error::Transient(message)
        } else {
            Error::UpstreamPermanent(message)
        }
    }

    /// Stable error code for the user-visible error surface (§7).
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Transient(_) | Error::VectorStore(_) | Error::Llm(_) => "SERVICE_UNAVAILABLE",
            Error::Timeout(_) => "TIMEOUT",
            Error::UpstreamPermanent(_) | Error::Exhausted { .. } | Error::Fatal(_) => {
                "PROCESSING_ERROR"
            }
            Error::Config(_) | Error::CircuitBreakerOpen => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_timeout_as_retryable() {
        let err = Error::classify_upstream("request timeout after 30s");
        assert!(err.is_retryable());
    }

    #[test]
    fn classifies_auth_failure_as_permanent() {
        let err = Error::classify_upstream("invalid api key");
        assert!(!err.is_retryable());
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::Validation("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(Error::Timeout(std::time::Duration::from_secs(1)).code(), "TIMEOUT");
    }
}
