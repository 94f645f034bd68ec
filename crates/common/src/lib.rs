//! Common utilities shared across resource server components.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (unverified peek, size limits, temporal validation)
pub mod jwt;
