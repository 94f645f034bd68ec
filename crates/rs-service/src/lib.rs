//! Resource Server Library
//!
//! A stateless OAuth2/OIDC resource server: verifies bearer JWTs issued by
//! explicitly trusted issuers and gates HTTP routes on token scopes.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> auth/authenticator.rs -> auth/issuer.rs -> auth/jwks.rs
//!                                     -> handlers/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Issuer registry, key sets, token verification, scope checks
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication, scope, preflight and metrics middleware
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
