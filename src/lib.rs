//! Resilient gateway library.
//!
//! Fronts a single unreliable upstream with a TTL response cache, a circuit
//! breaker, a request throttle with rotating client identities, and
//! deterministic fallback payloads.

pub mod admin;
pub mod cache;
pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod upstream;

pub use config::GatewayConfig;
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
