//! Metrics definitions for the resource server.
//!
//! All metrics follow Prometheus naming conventions:
//! - `rs_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 8 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS, OTHER)
//! - `endpoint`: the fixed route table plus `/other`
//! - `outcome`: `success` or one `AuthError` label
//! - `status`: `success` / `error`
//!
//! Issuer identifiers are never used as labels: unverified `iss` values are
//! attacker-controlled.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("rs_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Authentication is in-memory unless a key fetch happens
        .set_buckets_for_metric(
            Matcher::Prefix("rs_authentication".to_string()),
            &[
                0.0005, 0.001, 0.002, 0.005, 0.010, 0.050, 0.100, 0.500, 1.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set authentication buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("rs_jwks_refresh".to_string()),
            &[0.010, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000],
        )
        .map_err(|e| format!("Failed to set JWKS refresh buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `rs_http_requests_total`, `rs_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let method = normalize_method(method);
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("rs_http_request_duration_seconds",
        "method" => method,
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("rs_http_requests_total",
        "method" => method,
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Collapse extension methods into `OTHER`.
fn normalize_method(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "PATCH" => "PATCH",
        "DELETE" => "DELETE",
        "HEAD" => "HEAD",
        "OPTIONS" => "OPTIONS",
        _ => "OTHER",
    }
}

/// Map a request path onto the route table.
///
/// Unknown paths collapse into `/other` to bound cardinality.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/actuator/health" => "/actuator/health",
        "/actuator/prometheus" => "/actuator/prometheus",
        "/api/jwt/info" => "/api/jwt/info",
        "/api/sample/protected/openidscope" => "/api/sample/protected/openidscope",
        "/api/sample/protected/nonexistentscope" => "/api/sample/protected/nonexistentscope",
        _ => "/other",
    }
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record the outcome of one bearer token authentication.
///
/// Metric: `rs_authentications_total`, `rs_authentication_duration_seconds`
/// Labels: `outcome` (`success` or an `AuthError` label)
pub fn record_authentication(outcome: &'static str, duration: Duration) {
    histogram!("rs_authentication_duration_seconds", "outcome" => outcome)
        .record(duration.as_secs_f64());

    counter!("rs_authentications_total", "outcome" => outcome).increment(1);
}

/// Record a scope decision.
///
/// Metric: `rs_scope_decisions_total`
/// Labels: `decision` (`allowed` / `denied`)
pub fn record_scope_decision(allowed: bool) {
    let decision = if allowed { "allowed" } else { "denied" };
    counter!("rs_scope_decisions_total", "decision" => decision).increment(1);
}

// ============================================================================
// JWKS Metrics
// ============================================================================

/// Record a key-set fetch attempt.
///
/// Metric: `rs_jwks_refresh_total`, `rs_jwks_refresh_duration_seconds`
/// Labels: `status` (`success` / `error`)
pub fn record_jwks_refresh(status: &'static str, duration: Duration) {
    histogram!("rs_jwks_refresh_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());

    counter!("rs_jwks_refresh_total", "status" => status).increment(1);
}

/// Record that an expired key set was served because its refresh failed.
///
/// Metric: `rs_jwks_stale_served_total`
pub fn record_stale_jwks_served() {
    counter!("rs_jwks_stale_served_total").increment(1);
}
