//! TTL response store.
//!
//! # Responsibilities
//! - Keep payloads keyed by request key with an absolute expiry
//! - Hide expired entries from readers and evict them lazily
//! - Report total vs. still-valid entry counts
//!
//! # Design Decisions
//! - Sharded `DashMap`: every read-evict, write and clear is atomic per entry
//! - Lazy eviction re-checks expiry under the shard lock (`remove_if`), so a
//!   concurrent fresh `set` is never discarded
//! - Time comes from `tokio::time::Instant` so tests can pause the clock

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Point-in-time entry counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// All stored entries, including stale ones not yet evicted.
    pub total: usize,
    /// Entries unexpired at the instant of the call.
    pub valid: usize,
}

/// Thread-safe key/value store with per-entry TTL expiration.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Return the value for `key` if present and unexpired.
    ///
    /// A stale entry is removed as a side effect.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_fresh(now) {
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }

        // The read guard is released; only evict if the entry is still stale.
        self.entries.remove_if(key, |_, entry| !entry.is_fresh(now));
        None
    }

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    ///
    /// A zero TTL would never be observable, so nothing is stored.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        if ttl.is_zero() {
            self.entries.remove(&key);
            return;
        }
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key, entry);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove all expired entries, returning how many were evicted.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let mut total = 0;
        let mut valid = 0;
        for entry in self.entries.iter() {
            total += 1;
            if entry.value().is_fresh(now) {
                valid += 1;
            }
        }
        CacheStats { total, valid }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
