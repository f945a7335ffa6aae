//! Upstream data source abstraction.
//!
//! # Responsibilities
//! - Describe one upstream call (endpoint path + query parameters)
//! - Perform it with the identity chosen by the throttle
//! - Produce placeholder payloads when the live path is skipped or fails
//!
//! # Design Decisions
//! - `Upstream` returns a `'static` boxed future so the gateway can finish an
//!   attempt on its own task after the caller has gone away
//! - Fallbacks cannot fail; they are the last line of every request

pub mod fallback;
pub mod http;

use std::collections::BTreeMap;

use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

pub use fallback::StaticFallback;
pub use http::HttpUpstream;

/// Errors raised by an upstream fetch. Never surfaced to API consumers.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection, timeout or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// Body could not be decoded as JSON.
    #[error("invalid upstream payload: {0}")]
    Decode(String),

    /// The fetch task panicked or was cancelled.
    #[error("upstream task aborted: {0}")]
    Aborted(String),
}

/// One call against the upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    /// Gateway endpoint name.
    pub endpoint: String,
    /// Upstream path relative to the base URL.
    pub path: String,
    /// Query parameters, already normalized.
    pub params: BTreeMap<String, String>,
}

/// A live data source the gateway protects.
pub trait Upstream: Send + Sync {
    /// Fetch `request` presenting `identity` as the client signature.
    fn fetch(
        &self,
        request: UpstreamRequest,
        identity: Option<String>,
    ) -> BoxFuture<'static, Result<Value, UpstreamError>>;
}
