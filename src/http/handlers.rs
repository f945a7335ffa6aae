//! Public request handlers.

use std::collections::BTreeMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::cache::RequestKey;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::upstream::UpstreamRequest;

/// Query parameter that asks for the fallback payload.
pub const USE_MOCK_PARAM: &str = "use_mock";

pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let endpoints: Vec<String> = state
        .inner
        .endpoints
        .load()
        .names()
        .into_iter()
        .map(|name| format!("/api/{name}"))
        .collect();

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "features": [
            "Circuit breaker protecting the upstream",
            "Rotating client identities",
            "Randomized delay between upstream requests",
            "In-memory response cache",
            "Fallback payloads (add ?use_mock=true)",
            "Health check endpoint",
        ],
        "endpoints": endpoints,
        "status": "operational",
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let gateway = &state.inner.gateway;
    let breaker = gateway.breaker().status();

    Json(json!({
        "status": if breaker.is_open { "degraded" } else { "healthy" },
        "circuit_breaker": if breaker.is_open { "open" } else { "closed" },
        "cache_entries": gateway.cache().len(),
        "failures": breaker.consecutive_failures,
        "timestamp": unix_timestamp(),
    }))
}

/// `GET /api/{endpoint}`: serve through the gateway.
pub async fn endpoint(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(mut params): Query<BTreeMap<String, String>>,
) -> Response {
    let start = Instant::now();
    let table = state.inner.endpoints.load_full();

    let Some(endpoint) = table.get(&name).cloned() else {
        tracing::warn!(endpoint = %name, "Unknown endpoint");
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown endpoint", "endpoint": name })),
        )
            .into_response();
    };

    let use_mock = params
        .remove(USE_MOCK_PARAM)
        .map(|raw| parse_flag(&raw))
        .unwrap_or(false);

    let key = RequestKey::new(&endpoint.name, &params);
    let request = UpstreamRequest {
        endpoint: endpoint.name.clone(),
        path: endpoint.path.clone(),
        params: params.clone(),
    };
    let upstream = state.inner.upstream.clone();

    let outcome = state
        .inner
        .gateway
        .execute(
            &key,
            endpoint.ttl,
            use_mock,
            move |_, identity| upstream.fetch(request, identity),
            |key| {
                let body = table.fallback().payload_for(key.endpoint(), &params);
                async move { body }
            },
        )
        .await;

    tracing::debug!(
        endpoint = %endpoint.name,
        source = outcome.source.label(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request served"
    );
    metrics::record_request(&endpoint.name, outcome.source.label(), start);

    Json(outcome.into_body()).into_response()
}
