//! Static fallback payloads.

use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Map, Value};

use crate::config::EndpointConfig;

/// Serves each endpoint's configured placeholder payload.
#[derive(Debug, Clone, Default)]
pub struct StaticFallback {
    payloads: HashMap<String, Value>,
}

impl StaticFallback {
    pub fn from_endpoints(endpoints: &[EndpointConfig]) -> Self {
        let payloads = endpoints
            .iter()
            .filter_map(|e| e.fallback.clone().map(|payload| (e.name.clone(), payload)))
            .collect();
        Self { payloads }
    }

    /// Placeholder for `endpoint`, echoing the request parameters.
    ///
    /// Object payloads get a `params` field; anything else is wrapped as
    /// `{"data": payload, "params": ...}`.
    pub fn payload_for(&self, endpoint: &str, params: &BTreeMap<String, String>) -> Value {
        let mut body = match self.payloads.get(endpoint) {
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                let mut map = Map::new();
                map.insert("data".to_string(), other.clone());
                map
            }
            None => {
                let mut map = Map::new();
                map.insert("data".to_string(), Value::Null);
                map
            }
        };
        body.insert("params".to_string(), json!(params));
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(name: &str, fallback: Option<Value>) -> EndpointConfig {
        EndpointConfig {
            name: name.into(),
            path: format!("/{name}"),
            ttl_secs: None,
            cacheable: true,
            fallback,
        }
    }

    #[test]
    fn test_object_payload_gets_params() {
        let fallback = StaticFallback::from_endpoints(&[endpoint(
            "trending_searches",
            Some(json!({ "trending_searches": ["Netflix", "YouTube"] })),
        )]);
        let params = BTreeMap::from([("country".to_string(), "brazil".to_string())]);

        let body = fallback.payload_for("trending_searches", &params);
        assert_eq!(body["trending_searches"][0], "Netflix");
        assert_eq!(body["params"]["country"], "brazil");
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let fallback = StaticFallback::from_endpoints(&[endpoint("series", Some(json!([1, 2, 3])))]);
        let body = fallback.payload_for("series", &BTreeMap::new());
        assert_eq!(body["data"], json!([1, 2, 3]));
        assert_eq!(body["params"], json!({}));
    }

    #[test]
    fn test_missing_payload_is_null_data() {
        let fallback = StaticFallback::from_endpoints(&[endpoint("suggestions", None)]);
        let body = fallback.payload_for("suggestions", &BTreeMap::new());
        assert_eq!(body["data"], Value::Null);
    }
}
