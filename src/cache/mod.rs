//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (endpoint, params)
//!     → key.rs (canonical params → RequestKey)
//!     → store.rs (lookup, lazy eviction)
//!
//! Successful upstream fetch
//!     → store.rs (insert with TTL)
//!
//! Background (optional):
//!     sweeper ticker → store.rs purge_expired()
//! ```
//!
//! # Design Decisions
//! - Entries are independent; no operation spans multiple keys
//! - Cached values never carry response annotations (from_cache/is_mock)
//! - Expiry is lazy by default; the sweeper only bounds memory

pub mod key;
pub mod store;

pub use key::RequestKey;
pub use store::{CacheStats, TtlCache};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::observability::metrics;

/// Periodically purge expired entries until shutdown is signalled.
pub async fn run_sweeper<V: Clone>(
    cache: Arc<TtlCache<V>>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Cache sweeper starting");

    let mut ticker = time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = cache.purge_expired();
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = cache.len(), "Purged expired cache entries");
                }
                metrics::record_cache_size(cache.len());
            }
            _ = shutdown.recv() => {
                tracing::info!("Cache sweeper received shutdown signal, exiting loop");
                break;
            }
        }
    }
}
