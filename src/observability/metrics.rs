//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by endpoint and result source
//! - `gateway_request_duration_seconds` (histogram): latency by endpoint
//! - `gateway_cache_events_total` (counter): cache hits and misses
//! - `gateway_cache_entries` (gauge): stored entries, stale included
//! - `gateway_upstream_failures_total` (counter): failed upstream calls
//! - `gateway_circuit_open` (gauge): 1=open, 0=closed
//!
//! Without an installed recorder every call is a no-op, so library code and
//! tests record unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(endpoint: &str, source: &'static str, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "endpoint" => endpoint.to_string(),
        "source" => source
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "endpoint" => endpoint.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_event(event: &'static str) {
    metrics::counter!("gateway_cache_events_total", "event" => event).increment(1);
}

pub fn record_cache_size(entries: usize) {
    metrics::gauge!("gateway_cache_entries").set(entries as f64);
}

pub fn record_upstream_failure(endpoint: &str) {
    metrics::counter!(
        "gateway_upstream_failures_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

pub fn record_circuit_state(open: bool) {
    metrics::gauge!("gateway_circuit_open").set(if open { 1.0 } else { 0.0 });
}
