//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → handlers.rs (parse endpoint + params, strip use_mock)
//!     → routing (endpoint lookup)
//!     → gateway (cache / breaker / throttle / upstream / fallback)
//!     → JSON body with from_cache + is_mock
//! ```

pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer};
