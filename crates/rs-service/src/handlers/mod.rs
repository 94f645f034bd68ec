//! HTTP request handlers.
//!
//! # Components
//!
//! - `health` - Liveness endpoint
//! - `jwt_info` - Echoes the verified claims of the caller
//! - `sample` - Scope-protected sample endpoints
//! - `metrics` - Prometheus metrics endpoint

pub mod health;
pub mod jwt_info;
pub mod metrics;
pub mod sample;

pub use health::health_check;
pub use jwt_info::jwt_info;
pub use metrics::metrics_handler;
pub use sample::scope_protected;
