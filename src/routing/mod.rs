//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! GET /api/{endpoint}?params
//!     → table.rs (endpoint lookup)
//!     → Return: Endpoint (upstream path, TTL policy) or NoMatch
//!
//! Table compilation (startup and every reload):
//!     EndpointConfig[]
//!     → resolve TTL overrides against cache.ttl_secs
//!     → collect fallback payloads
//!     → Freeze as immutable EndpointTable
//! ```
//!
//! # Design Decisions
//! - Tables are compiled, then swapped atomically on reload
//! - Deterministic: same name always resolves to the same endpoint

pub mod table;

pub use table::{Endpoint, EndpointTable};
