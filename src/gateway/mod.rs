//! Gateway orchestration.
//!
//! # Data Flow
//! ```text
//! execute(key, ttl, force_fallback, fetch, fallback)
//!     → cache hit?                 → Outcome { Cache }
//!     → force_fallback / breaker open → fallback() → Outcome { Fallback }
//!     → throttle delay + identity
//!     → fetch() on its own task
//!         Ok  → cache.set, record_success → Outcome { Upstream }
//!         Err → record_failure, fallback() → Outcome { Fallback }
//! ```
//!
//! # Design Decisions
//! - `execute` is infallible; truthfulness is carried by the outcome source
//! - Fallback paths never touch the cache, the throttle or breaker counters
//! - A started fetch always finishes its accounting, even if the caller
//!   drops the request mid-flight
//! - Identical concurrent requests are not deduplicated

pub mod outcome;

pub use outcome::{FallbackReason, Outcome, Source};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde_json::Value;

use crate::cache::{RequestKey, TtlCache};
use crate::config::GatewayConfig;
use crate::observability::metrics;
use crate::resilience::{CircuitBreaker, Throttle};
use crate::upstream::UpstreamError;

/// The protection layer in front of one upstream.
pub struct Gateway {
    cache: Arc<TtlCache<Value>>,
    breaker: Arc<CircuitBreaker>,
    throttle: ArcSwap<Throttle>,
}

impl Gateway {
    pub fn new(cache: Arc<TtlCache<Value>>, breaker: Arc<CircuitBreaker>, throttle: Throttle) -> Self {
        Self {
            cache,
            breaker,
            throttle: ArcSwap::from_pointee(throttle),
        }
    }

    /// Fresh cache, closed breaker and entropy-seeded throttle.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            Arc::new(TtlCache::new()),
            Arc::new(CircuitBreaker::from_config(&config.circuit_breaker)),
            Throttle::new(&config.throttle),
        )
    }

    pub fn cache(&self) -> &Arc<TtlCache<Value>> {
        &self.cache
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Current throttle settings.
    pub fn throttle(&self) -> Arc<Throttle> {
        self.throttle.load_full()
    }

    /// Swap in new throttle settings; in-flight requests keep the old ones.
    pub fn replace_throttle(&self, throttle: Throttle) {
        self.throttle.store(Arc::new(throttle));
    }

    /// Serve `key` from cache, upstream or fallback. Never fails.
    ///
    /// `ttl` of `None` bypasses the cache entirely for this call, both the
    /// lookup and the store.
    pub async fn execute<F, Fut, B, BFut>(
        &self,
        key: &RequestKey,
        ttl: Option<Duration>,
        force_fallback: bool,
        fetch: F,
        fallback: B,
    ) -> Outcome
    where
        F: FnOnce(&RequestKey, Option<String>) -> Fut,
        Fut: Future<Output = Result<Value, UpstreamError>> + Send + 'static,
        B: FnOnce(&RequestKey) -> BFut,
        BFut: Future<Output = Value>,
    {
        if ttl.is_some() {
            if let Some(value) = self.cache.get(key.as_str()) {
                tracing::debug!(key = %key, "Cache hit");
                metrics::record_cache_event("hit");
                return Outcome::cached(value);
            }
            metrics::record_cache_event("miss");
        }

        if force_fallback {
            tracing::debug!(key = %key, "Fallback requested by caller");
            return Outcome::fallback(fallback(key).await, FallbackReason::Requested);
        }
        if !self.breaker.allow_request() {
            tracing::debug!(key = %key, "Circuit open, serving fallback");
            return Outcome::fallback(fallback(key).await, FallbackReason::CircuitOpen);
        }

        let throttle = self.throttle.load_full();
        let delay = throttle.next_delay();
        let identity = throttle.next_identity();
        drop(throttle);

        tracing::debug!(key = %key, delay_ms = delay.as_millis() as u64, "Throttling upstream call");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let attempt = fetch(key, identity);
        let cache = self.cache.clone();
        let breaker = self.breaker.clone();
        let cache_key = key.as_str().to_string();
        let endpoint = key.endpoint().to_string();

        // Runs to completion even if this future is dropped.
        let task = tokio::spawn(async move {
            let result = attempt.await;
            match &result {
                Ok(value) => {
                    if let Some(ttl) = ttl {
                        cache.set(cache_key, value.clone(), ttl);
                        metrics::record_cache_size(cache.len());
                    }
                    breaker.record_success();
                }
                Err(e) => {
                    tracing::error!(endpoint = %endpoint, error = %e, "Upstream call failed");
                    metrics::record_upstream_failure(&endpoint);
                    breaker.record_failure();
                }
            }
            result
        });

        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Upstream task aborted");
                self.breaker.record_failure();
                Err(UpstreamError::Aborted(e.to_string()))
            }
        };

        match result {
            Ok(value) => Outcome::live(value),
            Err(_) => Outcome::fallback(fallback(key).await, FallbackReason::UpstreamFailure),
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("cache_entries", &self.cache.len())
            .field("breaker", &self.breaker.status())
            .field("throttle", &self.throttle.load_full())
            .finish()
    }
}
