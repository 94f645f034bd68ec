//! Health check handler.

use axum::Json;
use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Handler for GET /actuator/health
///
/// The resource server holds no connections that could be unhealthy; key
/// fetch failures surface per request instead.
///
/// ```json
/// { "status": "UP" }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}
