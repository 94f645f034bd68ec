//! Middleware for the resource server.
//!
//! # Components
//!
//! - `auth` - Bearer authentication and per-route scope guards
//! - `preflight` - Answers OPTIONS requests before authentication
//! - `http_metrics` - Request metrics for every response

pub mod auth;
pub mod http_metrics;
pub mod preflight;

pub use auth::{require_auth, require_scope, AuthState, PrincipalExt};
pub use http_metrics::http_metrics_middleware;
pub use preflight::handle_preflight;
