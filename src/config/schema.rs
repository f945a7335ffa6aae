//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Root configuration for the resilience gateway.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, concurrency).
    pub listener: ListenerConfig,

    /// Timeout configuration for inbound requests.
    pub timeouts: TimeoutConfig,

    /// Upstream data source settings.
    pub upstream: UpstreamConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Circuit breaker settings.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Request pacing and identity rotation.
    pub throttle: ThrottleConfig,

    /// Endpoints exposed under `/api/{name}`.
    ///
    /// Omitting the key keeps the built-in endpoints; any `[[endpoints]]`
    /// entry replaces them all.
    pub endpoints: Vec<EndpointConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            throttle: ThrottleConfig::default(),
            endpoints: default_endpoints(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Maximum requests processed concurrently (backpressure).
    pub max_concurrent_requests: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            max_concurrent_requests: 1_024,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one inbound request, throttle delay included.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 120 }
    }
}

/// Upstream data source configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Upstream request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9000".to_string(),
            connect_timeout_secs: 30,
            request_timeout_secs: 60,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Default time-to-live for cached responses in seconds.
    pub ttl_secs: u64,

    /// Interval of the background expiry sweep in seconds (0 = lazy expiry only).
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3_600,
            sweep_interval_secs: 0,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before a probe is allowed.
    pub timeout_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            timeout_secs: 300,
        }
    }
}

/// Throttle configuration: randomized delay bounds and identity pool.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Lower bound of the pre-request delay in milliseconds.
    pub min_delay_ms: u64,

    /// Upper bound of the pre-request delay in milliseconds.
    pub max_delay_ms: u64,

    /// Client identities (sent as `User-Agent`) rotated across requests.
    pub identities: Vec<String>,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 5_000,
            max_delay_ms: 15_000,
            identities: default_identities(),
        }
    }
}

fn default_identities() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// A gateway endpoint backed by one upstream path.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Endpoint identifier, used in the route and the cache key.
    pub name: String,

    /// Upstream path appended to `upstream.base_url`.
    pub path: String,

    /// Per-endpoint TTL override in seconds.
    #[serde(default)]
    pub ttl_secs: Option<u64>,

    /// Whether live results are cached (default: true).
    #[serde(default = "default_cacheable")]
    pub cacheable: bool,

    /// Static payload served when the live path is unavailable.
    #[serde(default)]
    pub fallback: Option<Value>,
}

fn default_cacheable() -> bool {
    true
}

/// Trending searches, interest over time and (uncached) suggestions.
pub fn default_endpoints() -> Vec<EndpointConfig> {
    vec![
        EndpointConfig {
            name: "trending_searches".to_string(),
            path: "/trending-searches".to_string(),
            ttl_secs: None,
            cacheable: true,
            fallback: Some(json!({
                "country": "brazil",
                "trending_searches": [
                    "Inteligência Artificial",
                    "ChatGPT",
                    "Copa do Mundo",
                    "Eleições 2024",
                    "Bitcoin",
                ],
            })),
        },
        EndpointConfig {
            name: "interest_over_time".to_string(),
            path: "/interest-over-time".to_string(),
            ttl_secs: Some(1_800),
            cacheable: true,
            fallback: Some(json!({ "keywords": ["Python"], "data": [] })),
        },
        EndpointConfig {
            name: "suggestions".to_string(),
            path: "/suggestions".to_string(),
            ttl_secs: None,
            cacheable: false,
            fallback: Some(json!({ "suggestions": [] })),
        },
    ]
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format ("pretty" or "compact").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Shipped admin key. Startup warns while it is still in use.
pub const PLACEHOLDER_ADMIN_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Admin API configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: PLACEHOLDER_ADMIN_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = GatewayConfig::default();
        assert_eq!(config.cache.ttl_secs, 3_600);
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert_eq!(config.circuit_breaker.timeout_secs, 300);
        assert_eq!(config.throttle.min_delay_ms, 5_000);
        assert_eq!(config.throttle.max_delay_ms, 15_000);
        assert_eq!(config.throttle.identities.len(), 5);
        assert!(config.admin.enabled);

        let names: Vec<_> = config.endpoints.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["trending_searches", "interest_over_time", "suggestions"]);
        assert!(config.endpoints.iter().all(|e| e.fallback.is_some()));
        assert!(!config.endpoints[2].cacheable);
    }

    #[test]
    fn test_config_without_endpoints_keeps_builtin_ones() {
        let config: GatewayConfig = toml::from_str("[cache]\nttl_secs = 60\n").unwrap();
        assert_eq!(config.endpoints, default_endpoints());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let raw = r#"
            [circuit_breaker]
            failure_threshold = 5

            [[endpoints]]
            name = "trending_searches"
            path = "/trending"
            fallback = { trending_searches = ["a", "b"] }

            [[endpoints]]
            name = "suggestions"
            path = "/suggest"
            cacheable = false
        "#;
        let config: GatewayConfig = toml::from_str(raw).unwrap();

        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.timeout_secs, 300);
        assert_eq!(config.endpoints.len(), 2);
        assert!(config.endpoints[0].cacheable);
        assert_eq!(
            config.endpoints[0].fallback.as_ref().unwrap()["trending_searches"][1],
            "b"
        );
        assert!(!config.endpoints[1].cacheable);
        assert!(config.endpoints[1].fallback.is_none());
    }
}
