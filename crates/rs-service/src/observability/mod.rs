//! Observability module for the resource server.
//!
//! Provides metrics definitions and instrumentation helpers.

pub mod metrics;
