//! Annotated results returned by the gateway.

use serde_json::{Map, Value};

/// Why a placeholder was served instead of live data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The caller asked for degraded mode.
    Requested,
    /// The circuit breaker refused the live call.
    CircuitOpen,
    /// The live call was attempted and failed.
    UpstreamFailure,
}

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Upstream,
    Fallback(FallbackReason),
}

impl Source {
    /// Metric label for this source.
    pub fn label(&self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::Upstream => "upstream",
            Source::Fallback(FallbackReason::Requested) => "fallback_requested",
            Source::Fallback(FallbackReason::CircuitOpen) => "fallback_circuit_open",
            Source::Fallback(FallbackReason::UpstreamFailure) => "fallback_upstream_failure",
        }
    }
}

/// A gateway result. The payload is never modified to carry annotations;
/// they are derived from `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub value: Value,
    pub source: Source,
}

impl Outcome {
    pub fn cached(value: Value) -> Self {
        Self {
            value,
            source: Source::Cache,
        }
    }

    pub fn live(value: Value) -> Self {
        Self {
            value,
            source: Source::Upstream,
        }
    }

    pub fn fallback(value: Value, reason: FallbackReason) -> Self {
        Self {
            value,
            source: Source::Fallback(reason),
        }
    }

    pub fn from_cache(&self) -> bool {
        self.source == Source::Cache
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.source, Source::Fallback(_))
    }

    /// Response body: object payloads get `from_cache` and `is_mock` merged
    /// in, other payloads are wrapped under `data`.
    pub fn into_body(self) -> Value {
        let from_cache = self.from_cache();
        let is_mock = self.is_mock();
        let mut body = match self.value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        body.insert("from_cache".to_string(), Value::Bool(from_cache));
        body.insert("is_mock".to_string(), Value::Bool(is_mock));
        Value::Object(body)
    }
}
