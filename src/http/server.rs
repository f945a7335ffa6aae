//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, CORS, concurrency)
//! - Bind server to listener
//! - Start background tasks (cache sweeper, config reload)
//! - Graceful shutdown on the lifecycle broadcast

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::cache;
use crate::config::{check_request_budget, GatewayConfig, ValidationError};
use crate::gateway::Gateway;
use crate::http::handlers;
use crate::resilience::Throttle;
use crate::routing::EndpointTable;
use crate::upstream::{HttpUpstream, Upstream, UpstreamError};

/// Shared state behind every handler.
pub struct AppInner {
    pub gateway: Gateway,
    pub upstream: Arc<dyn Upstream>,
    pub endpoints: ArcSwap<EndpointTable>,
    pub config: GatewayConfig,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<AppInner>,
}

impl AppState {
    pub fn new(config: GatewayConfig, upstream: Arc<dyn Upstream>) -> Self {
        let inner = AppInner {
            gateway: Gateway::from_config(&config),
            upstream,
            endpoints: ArcSwap::from_pointee(EndpointTable::from_config(&config)),
            config,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Apply a reloaded configuration.
    ///
    /// Throttle and endpoints are swapped; cache contents and breaker state
    /// are kept. Returns the sections whose changes only take effect on
    /// restart. A reload whose throttle no longer fits the running request
    /// timeout is rejected as a whole.
    pub fn apply_config(&self, config: &GatewayConfig) -> Result<Vec<&'static str>, ValidationError> {
        let running = &self.inner.config;

        // The timeout layer and the upstream client keep their startup values.
        check_request_budget(
            running.timeouts.request_secs,
            config.throttle.max_delay_ms,
            running.upstream.request_timeout_secs,
        )
        .inspect_err(|e| {
            tracing::error!(error = %e, "Rejected configuration reload; keeping current configuration");
        })?;

        self.inner.gateway.replace_throttle(Throttle::new(&config.throttle));
        self.inner
            .endpoints
            .store(Arc::new(EndpointTable::from_config(config)));

        let pending = restart_required(running, config);
        for section in &pending {
            tracing::warn!(section, "Settings changed; restart required to apply them");
        }

        tracing::info!(
            endpoints = config.endpoints.len(),
            min_delay_ms = config.throttle.min_delay_ms,
            max_delay_ms = config.throttle.max_delay_ms,
            "Configuration reloaded"
        );
        Ok(pending)
    }
}

/// Sections fixed at startup that differ between `running` and `next`.
fn restart_required(running: &GatewayConfig, next: &GatewayConfig) -> Vec<&'static str> {
    let mut pending = Vec::new();
    if running.listener != next.listener {
        pending.push("listener");
    }
    if running.timeouts != next.timeouts {
        pending.push("timeouts");
    }
    if running.upstream != next.upstream {
        pending.push("upstream");
    }
    if running.cache.sweep_interval_secs != next.cache.sweep_interval_secs {
        pending.push("cache.sweep_interval_secs");
    }
    if running.circuit_breaker != next.circuit_breaker {
        pending.push("circuit_breaker");
    }
    if running.observability != next.observability {
        pending.push("observability");
    }
    if running.admin != next.admin {
        pending.push("admin");
    }
    pending
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server talking to the configured HTTP upstream.
    pub fn new(config: GatewayConfig) -> Result<Self, UpstreamError> {
        let upstream = Arc::new(HttpUpstream::new(&config.upstream)?);
        Ok(Self::with_upstream(config, upstream))
    }

    /// Create a server over any upstream implementation.
    pub fn with_upstream(config: GatewayConfig, upstream: Arc<dyn Upstream>) -> Self {
        let state = AppState::new(config, upstream);
        let router = Self::build_router(&state);
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: &AppState) -> Router {
        let config = &state.inner.config;

        let mut router = Router::new()
            .route("/", get(handlers::root))
            .route("/health", get(handlers::health))
            .route("/api/{endpoint}", get(handlers::endpoint));
        if config.admin.enabled {
            router = router.merge(setup_admin_router(state.clone()));
        }

        router
            .with_state(state.clone())
            // One semaphore shared by every route.
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_concurrent_requests))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CorsLayer::permissive())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweep_secs = self.state.inner.config.cache.sweep_interval_secs;
        if sweep_secs > 0 {
            tokio::spawn(cache::run_sweeper(
                self.state.inner.gateway.cache().clone(),
                Duration::from_secs(sweep_secs),
                shutdown.resubscribe(),
            ));
        }

        let reload_state = self.state.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => {
                            let _ = reload_state.apply_config(&config);
                        }
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(config: GatewayConfig) -> AppState {
        let upstream = Arc::new(HttpUpstream::new(&config.upstream).unwrap());
        AppState::new(config, upstream)
    }

    #[test]
    fn test_reload_swaps_throttle_and_endpoints() {
        let state = state(GatewayConfig::default());
        let mut next = GatewayConfig::default();
        next.throttle.min_delay_ms = 100;
        next.throttle.max_delay_ms = 200;
        next.endpoints.truncate(1);

        assert_eq!(state.apply_config(&next), Ok(vec![]));
        assert_eq!(
            state.inner.gateway.throttle().delay_bounds(),
            (Duration::from_millis(100), Duration::from_millis(200))
        );
        assert_eq!(state.inner.endpoints.load().names(), vec!["trending_searches"]);
    }

    #[test]
    fn test_reload_reports_startup_only_sections() {
        let state = state(GatewayConfig::default());
        let mut next = GatewayConfig::default();
        next.admin.api_key = "rotated".into();
        next.timeouts.request_secs = 300;
        next.circuit_breaker.failure_threshold = 10;

        let pending = state.apply_config(&next).unwrap();
        assert_eq!(pending, vec!["timeouts", "circuit_breaker", "admin"]);
        // Still the startup values.
        assert_eq!(state.inner.config.admin.api_key, "CHANGE_ME_IN_PRODUCTION");
        assert_eq!(state.inner.gateway.breaker().status().threshold, 3);
    }

    #[test]
    fn test_reload_rejected_when_throttle_outgrows_running_timeout() {
        // Running: 120s budget, 60s upstream timeout.
        let state = state(GatewayConfig::default());
        let mut next = GatewayConfig::default();
        next.timeouts.request_secs = 600;
        next.throttle.max_delay_ms = 90_000;

        assert_eq!(
            state.apply_config(&next),
            Err(ValidationError::RequestTimeoutTooShort {
                request_secs: 120,
                max_delay_ms: 90_000,
                upstream_timeout_secs: 60,
            })
        );
        assert_eq!(
            state.inner.gateway.throttle().delay_bounds().1,
            Duration::from_millis(15_000)
        );
    }
}
