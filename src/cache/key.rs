//! Request key derivation.
//!
//! A key is `endpoint:sha256(canonical params)`. Parameters are canonicalized
//! through a `BTreeMap`, so two requests that differ only in parameter order
//! map to the same key.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Deterministic identifier of one logical upstream request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    endpoint: String,
    key: String,
}

impl RequestKey {
    /// Derive the key for `endpoint` called with `params`.
    pub fn new<K, V, I>(endpoint: &str, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        let canonical: BTreeMap<String, serde_json::Value> = params
            .into_iter()
            .map(|(k, v)| (k.into(), serde_json::to_value(v).unwrap_or_default()))
            .collect();
        let encoded = serde_json::to_string(&canonical).unwrap_or_default();

        let digest = Sha256::digest(encoded.as_bytes());
        let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

        Self {
            endpoint: endpoint.to_string(),
            key: format!("{}:{}", endpoint, hash),
        }
    }

    /// The endpoint this key belongs to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
