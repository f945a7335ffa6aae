//! Endpoint table.
//!
//! # Responsibilities
//! - Resolve an endpoint name to its upstream path and cache policy
//! - Own the fallback payloads for those endpoints
//!
//! # Design Decisions
//! - Built once per (re)load and swapped as a whole
//! - Exact name lookup; endpoint names are unique after validation

use std::collections::HashMap;
use std::time::Duration;

use crate::config::{EndpointConfig, GatewayConfig};
use crate::upstream::StaticFallback;

/// A compiled endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub path: String,
    /// `None` when live results must not be cached.
    pub ttl: Option<Duration>,
}

impl Endpoint {
    fn compile(config: &EndpointConfig, default_ttl: Duration) -> Self {
        let ttl = config
            .cacheable
            .then(|| config.ttl_secs.map(Duration::from_secs).unwrap_or(default_ttl));
        Self {
            name: config.name.clone(),
            path: config.path.clone(),
            ttl,
        }
    }
}

/// Immutable lookup structure for configured endpoints.
#[derive(Debug, Clone, Default)]
pub struct EndpointTable {
    endpoints: HashMap<String, Endpoint>,
    fallback: StaticFallback,
    default_ttl: Duration,
}

impl EndpointTable {
    pub fn from_config(config: &GatewayConfig) -> Self {
        let default_ttl = Duration::from_secs(config.cache.ttl_secs);
        let endpoints = config
            .endpoints
            .iter()
            .map(|e| (e.name.clone(), Endpoint::compile(e, default_ttl)))
            .collect();

        Self {
            endpoints,
            fallback: StaticFallback::from_endpoints(&config.endpoints),
            default_ttl,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    pub fn fallback(&self) -> &StaticFallback {
        &self.fallback
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Endpoint names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.endpoints.keys().cloned().collect();
        names.sort();
        names
    }
}
