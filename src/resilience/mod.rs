//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Live request to upstream:
//!     → circuit_breaker.rs (allow_request? otherwise serve fallback)
//!     → throttle.rs (random delay, random client identity)
//!     → upstream call
//!     → circuit_breaker.rs (record_success / record_failure)
//! ```
//!
//! # Design Decisions
//! - Failures are absorbed: they feed the breaker and become fallbacks
//! - No lock is held across the throttle delay or the upstream call
//! - Throttle randomness is injectable for deterministic tests

pub mod circuit_breaker;
pub mod throttle;

pub use circuit_breaker::{BreakerStatus, CircuitBreaker};
pub use throttle::Throttle;
