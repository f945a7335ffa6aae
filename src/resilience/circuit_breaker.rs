//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: upstream assumed failing, requests are served from fallback
//! - Half-Open: cooldown elapsed, the next caller probes the upstream
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= threshold
//! Open → Half-Open: first allow_request() after the cooldown
//! Half-Open → Closed: immediately, before the probe result is known
//! Closed → Open: a failing probe pushes the counter past threshold again
//! ```
//!
//! # Design Decisions
//! - One breaker per upstream, shared by every endpoint of that upstream
//! - Half-open is transient: the reset happens inside `allow_request()` under
//!   the same lock as the check, so no background timer is needed
//! - Requests arriving together at cooldown expiry may all probe
//! - Fallback-served requests never touch the counters

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

#[derive(Debug, Default)]
struct BreakerState {
    consecutive_failures: u32,
    is_open: bool,
    last_failure_at: Option<Instant>,
}

/// Read-only view of the breaker for health and admin endpoints.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BreakerStatus {
    pub is_open: bool,
    pub consecutive_failures: u32,
    pub threshold: u32,
    pub timeout_secs: u64,
}

/// Failure-counting circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    timeout: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(threshold: u32, timeout: Duration) -> Self {
        Self {
            threshold,
            timeout,
            state: Mutex::new(BreakerState::default()),
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(
            config.failure_threshold,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a live upstream call may be attempted now.
    ///
    /// Once the cooldown has elapsed the breaker is closed and its counter
    /// reset before returning `true`.
    pub fn allow_request(&self) -> bool {
        let mut state = self.lock();
        if !state.is_open {
            return true;
        }

        let cooling = state
            .last_failure_at
            .map(|at| at.elapsed() < self.timeout)
            .unwrap_or(false);
        if cooling {
            return false;
        }

        state.is_open = false;
        state.consecutive_failures = 0;
        drop(state);

        tracing::info!("Circuit breaker half-open, allowing probe request");
        metrics::record_circuit_state(false);
        true
    }

    /// Record a successful upstream call.
    pub fn record_success(&self) {
        let mut state = self.lock();
        let was_open = state.is_open;
        state.consecutive_failures = 0;
        state.is_open = false;
        drop(state);

        if was_open {
            tracing::info!("Circuit breaker closed after successful call");
            metrics::record_circuit_state(false);
        }
    }

    /// Record a failed upstream call.
    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        state.last_failure_at = Some(Instant::now());

        if state.consecutive_failures >= self.threshold {
            let failures = state.consecutive_failures;
            let newly_opened = !state.is_open;
            state.is_open = true;
            drop(state);

            tracing::warn!(
                failures,
                threshold = self.threshold,
                cooldown_secs = self.timeout.as_secs(),
                "Circuit breaker OPEN - too many consecutive failures"
            );
            if newly_opened {
                metrics::record_circuit_state(true);
            }
        }
    }

    /// Current stored state. Unlike `allow_request`, this never transitions.
    pub fn status(&self) -> BreakerStatus {
        let state = self.lock();
        BreakerStatus {
            is_open: state.is_open,
            consecutive_failures: state.consecutive_failures,
            threshold: self.threshold,
            timeout_secs: self.timeout.as_secs(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_open
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::from_config(&CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    const TIMEOUT: Duration = Duration::from_secs(300);

    #[test]
    fn test_starts_closed() {
        let breaker = CircuitBreaker::default();
        assert!(breaker.allow_request());
        assert_eq!(
            breaker.status(),
            BreakerStatus {
                is_open: false,
                consecutive_failures: 0,
                threshold: 3,
                timeout_secs: 300,
            }
        );
    }

    #[test]
    fn test_opens_at_threshold() {
        let breaker = CircuitBreaker::new(3, TIMEOUT);
        breaker.record_failure();
        breaker.record_failure();
        assert!(!breaker.is_open());
        assert!(breaker.allow_request());

        breaker.record_failure();
        assert!(breaker.is_open());
        assert!(!breaker.allow_request());
        assert_eq!(breaker.status().consecutive_failures, 3);
    }

    #[test]
    fn test_success_resets() {
        let breaker = CircuitBreaker::new(3, TIMEOUT);
        for _ in 0..4 {
            breaker.record_failure();
        }
        assert!(breaker.is_open());

        breaker.record_success();
        let status = breaker.status();
        assert!(!status.is_open);
        assert_eq!(status.consecutive_failures, 0);
        assert!(breaker.allow_request());
    }

    #[test]
    fn test_success_between_failures_prevents_opening() {
        let breaker = CircuitBreaker::new(3, TIMEOUT);
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();
        assert!(!breaker.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_after_timeout() {
        let breaker = CircuitBreaker::new(3, TIMEOUT);
        for _ in 0..3 {
            breaker.record_failure();
        }

        advance(Duration::from_secs(10)).await;
        assert!(!breaker.allow_request());
        advance(Duration::from_secs(289)).await;
        assert!(!breaker.allow_request());

        advance(Duration::from_secs(1)).await;
        assert!(breaker.allow_request());
        let status = breaker.status();
        assert!(!status.is_open);
        assert_eq!(status.consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_probe_reopens_after_threshold() {
        let breaker = CircuitBreaker::new(1, TIMEOUT);
        breaker.record_failure();
        assert!(!breaker.allow_request());

        advance(TIMEOUT).await;
        assert!(breaker.allow_request());

        breaker.record_failure();
        assert!(breaker.is_open());
        assert!(!breaker.allow_request());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_measured_from_last_failure() {
        let breaker = CircuitBreaker::new(2, TIMEOUT);
        breaker.record_failure();
        breaker.record_failure();
        advance(Duration::from_secs(200)).await;
        // Late failure from a request that started before the circuit opened.
        breaker.record_failure();

        advance(Duration::from_secs(200)).await;
        assert!(!breaker.allow_request());
        advance(Duration::from_secs(100)).await;
        assert!(breaker.allow_request());
    }

    #[test]
    fn test_status_does_not_transition() {
        let breaker = CircuitBreaker::new(1, Duration::ZERO);
        breaker.record_failure();
        assert!(breaker.status().is_open);
        assert!(breaker.status().is_open);
        assert!(breaker.allow_request());
        assert!(!breaker.status().is_open);
    }

    #[test]
    fn test_concurrent_failures_are_all_counted() {
        let breaker = CircuitBreaker::new(50, TIMEOUT);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        breaker.record_failure();
                    }
                });
            }
        });

        let status = breaker.status();
        assert_eq!(status.consecutive_failures, 200);
        assert!(status.is_open);
    }
}
