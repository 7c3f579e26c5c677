//! Per-subagent-instance circuit breaker: opens after N consecutive
//! failures, half-opens for one probe after a recovery timeout.

use std::time::{Duration, Instant};

use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

pub struct CircuitBreaker {
    state: RwLock<State>,
    failure_threshold: u32,
    recovery_timeout: Duration,
    failures: RwLock<u32>,
    opened_at: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(State::Closed),
            failure_threshold,
            recovery_timeout,
            failures: RwLock::new(0),
            opened_at: RwLock::new(None),
        }
    }

    /// Whether a new attempt may proceed. Transitions `Open ->
    /// HalfOpen` as a side effect once the recovery timeout elapses.
    pub fn allow_request(&self) -> bool {
        let mut state = self.state.write();
        match *state {
            State::Closed => true,
            State::HalfOpen => true,
            State::Open => {
                let elapsed = self.opened_at.read().map(|t| t.elapsed());
                if elapsed.map(|e| e > self.recovery_timeout).unwrap_or(false) {
                    *state = State::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.write();
        if *state == State::HalfOpen {
            *state = State::Closed;
            *self.failures.write() = 0;
            *self.opened_at.write() = None;
        }
    }

    pub fn record_failure(&self) {
        if *self.state.read() == State::HalfOpen {
            *self.state.write() = State::Open;
            *self.opened_at.write() = Some(Instant::now());
            return;
        }

        let mut failures = self.failures.write();
        *failures += 1;
        if *failures >= self.failure_threshold {
            *self.state.write() = State::Open;
            *self.opened_at.write() = Some(Instant::now());
        }
    }

    pub fn is_open(&self) -> bool {
        !self.allow_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            cb.record_failure();
        }
        assert!(cb.is_open());
    }

    #[test]
    fn half_opens_after_timeout_and_closes_on_success() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(10));
        cb.record_failure();
        assert!(cb.is_open());
        std::thread::sleep(Duration::from_millis(20));
        assert!(cb.allow_request());
        cb.record_success();
        assert!(!cb.is_open());
    }

    #[test]
    fn failure_in_half_open_reopens() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(10));
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(20));
        assert!(cb.allow_request());
        cb.record_failure();
        assert!(cb.is_open());
    }

    #[test]
    fn closed_by_default() {
        let cb = CircuitBreaker::new(5, Duration::from_secs(60));
        assert!(!cb.is_open());
    }
}
