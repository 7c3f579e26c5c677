//! Bounded retry with pluggable backoff, keyed on
//! [`research_core::Error::is_retryable`] rather than string matching.

use std::time::Duration;

use research_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    Exponential,
    Linear,
    Immediate,
}

impl BackoffStrategy {
    fn delay(&self, attempt: u32) -> Duration {
        const CAP: Duration = Duration::from_secs(30);
        match self {
            BackoffStrategy::Exponential => {
                let secs = 2u64.saturating_pow(attempt).min(CAP.as_secs());
                Duration::from_secs(secs)
            }
            BackoffStrategy::Linear => {
                let secs = ((attempt as u64) + 1) * 5;
                Duration::from_secs(secs).min(CAP)
            }
            BackoffStrategy::Immediate => Duration::ZERO,
        }
    }
}

pub struct Retrier {
    max_retries: u32,
    strategy: BackoffStrategy,
}

impl Retrier {
    pub fn new(max_retries: u32, strategy: BackoffStrategy) -> Self {
        Self {
            max_retries,
            strategy,
        }
    }

    /// Run `f` up to `max_retries + 1` times. Non-retryable errors
    /// break immediately; retryable errors back off between attempts.
    pub async fn run<T, F, Fut>(&self, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_retryable() || attempt >= self.max_retries {
                        return Err(Error::Exhausted {
                            attempts: attempt + 1,
                            last_error: err.to_string(),
                        });
                    }
                    let delay = self.strategy.delay(attempt);
                    if delay > Duration::ZERO {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn stops_immediately_on_non_retryable_error() {
        let retrier = Retrier::new(3, BackoffStrategy::Immediate);
        let calls = AtomicU32::new(0);
        let result: Result<()> = retrier
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::Validation("bad input".to_string())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_up_to_bound() {
        let retrier = Retrier::new(2, BackoffStrategy::Immediate);
        let calls = AtomicU32::new(0);
        let result: Result<()> = retrier
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::Transient("timeout".to_string())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failure() {
        let retrier = Retrier::new(3, BackoffStrategy::Immediate);
        let calls = AtomicU32::new(0);
        let result = retrier
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 1 {
                        Err(Error::Transient("timeout".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
    }
}
