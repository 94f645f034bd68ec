//! Handler that returns the caller's verified claims.

use crate::auth::Principal;
use axum::{Extension, Json};
use serde_json::{Map, Value};
use tracing::instrument;

/// Handler for GET /api/jwt/info
///
/// Returns every claim of the verified token, as the issuer sent them.
/// Requires valid authentication via the auth middleware.
///
/// ```json
/// {
///   "iss": "https://issuer.example.com",
///   "sub": "user-123",
///   "scope": "openid profile",
///   "exp": 1900000000
/// }
/// ```
#[instrument(skip_all, name = "rs.handlers.jwt_info")]
pub async fn jwt_info(Extension(principal): Extension<Principal>) -> Json<Map<String, Value>> {
    tracing::debug!(target: "rs.handlers.jwt_info", "Returning token claims");
    Json(principal.claims().raw().clone())
}
