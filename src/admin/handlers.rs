use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::handlers::unix_timestamp;
use crate::http::server::AppState;
use crate::resilience::BreakerStatus;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub circuit_open: bool,
    pub cache_entries: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CacheStatsResponse {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub cache_ttl_seconds: u64,
    pub timestamp: u64,
}

#[derive(Serialize)]
pub struct CacheClearResponse {
    pub message: &'static str,
    pub removed: usize,
    pub timestamp: u64,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let gateway = &state.inner.gateway;
    let circuit_open = gateway.breaker().is_open();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if circuit_open { "degraded" } else { "operational" },
        circuit_open,
        cache_entries: gateway.cache().len(),
    })
}

pub async fn get_cache(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let stats = state.inner.gateway.cache().stats();
    let ttl = state.inner.endpoints.load().default_ttl();
    Json(CacheStatsResponse {
        total_entries: stats.total,
        valid_entries: stats.valid,
        cache_ttl_seconds: ttl.as_secs(),
        timestamp: unix_timestamp(),
    })
}

pub async fn clear_cache(State(state): State<AppState>) -> Json<CacheClearResponse> {
    let cache = state.inner.gateway.cache();
    let removed = cache.len();
    cache.clear();
    tracing::info!(removed, "Cache cleared via admin API");

    Json(CacheClearResponse {
        message: "Cache cleared",
        removed,
        timestamp: unix_timestamp(),
    })
}

pub async fn get_breaker(State(state): State<AppState>) -> Json<BreakerStatus> {
    Json(state.inner.gateway.breaker().status())
}
