//! Prometheus metrics endpoint handler.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /actuator/prometheus
///
/// Returns all recorded metrics in Prometheus text format.
/// Unauthenticated; carries no identifiers (see `observability::metrics`).
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
