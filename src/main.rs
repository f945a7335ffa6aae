//! Resilient gateway binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http::server ──▶ http::handlers ──▶ routing::EndpointTable
//!                                                       │
//!                                                       ▼
//!                                                gateway::Gateway
//!                                   ┌──────────────┼───────────────┐
//!                                   ▼              ▼               ▼
//!                             cache::TtlCache  resilience     upstream
//!                                              breaker +      HttpUpstream /
//!                                              throttle       StaticFallback
//! ```
//!
//! Configuration comes from an optional TOML file (`--config`). When a file
//! is given it is watched and reloads are applied without restarting.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use resilient_gateway::config::{
    load_config, schema::PLACEHOLDER_ADMIN_KEY, watcher::ConfigWatcher, GatewayConfig,
};
use resilient_gateway::lifecycle::{wait_for_shutdown_signal, Shutdown};
use resilient_gateway::observability::{logging, metrics};
use resilient_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "resilient-gateway")]
#[command(about = "Caching, circuit-breaking gateway in front of a flaky upstream", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "resilient-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        endpoints = config.endpoints.len(),
        failure_threshold = config.circuit_breaker.failure_threshold,
        breaker_timeout_secs = config.circuit_breaker.timeout_secs,
        cache_ttl_secs = config.cache.ttl_secs,
        "Configuration loaded"
    );

    if config.admin.enabled && config.admin.api_key == PLACEHOLDER_ADMIN_KEY {
        tracing::warn!("Admin API is using the placeholder key; set admin.api_key");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher stops when dropped.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        signal_shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
