//! Resource server error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse` impl.
//! Error messages returned to clients are intentionally generic to avoid
//! leaking internal details (which issuer, which key id). Actual errors are
//! logged server-side.

use crate::auth::AuthError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Realm advertised in `WWW-Authenticate` challenges.
pub const AUTH_REALM: &str = "resource-server";

/// Resource server error type.
///
/// Maps to appropriate HTTP status codes:
/// - Unauthorized: 401 Unauthorized
/// - Forbidden: 403 Forbidden
#[derive(Debug, Error)]
pub enum RsError {
    #[error("Unauthorized: {0}")]
    Unauthorized(AuthError),

    #[error("Forbidden: {0}")]
    Forbidden(AuthError),
}

impl RsError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            RsError::Unauthorized(_) => 401,
            RsError::Forbidden(_) => 403,
        }
    }
}

/// Authentication failures become 401, scope failures 403.
impl From<AuthError> for RsError {
    fn from(err: AuthError) -> Self {
        if err.is_authorization_failure() {
            RsError::Forbidden(err)
        } else {
            RsError::Unauthorized(err)
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for RsError {
    fn into_response(self) -> Response {
        let (status, code, message, challenge) = match &self {
            RsError::Unauthorized(AuthError::MissingCredentials) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication is required to access this resource",
                format!("Bearer realm=\"{AUTH_REALM}\""),
            ),
            RsError::Unauthorized(kind) => {
                // Log actual reason server-side
                tracing::debug!(target: "rs.errors", reason = kind.as_str(), "Rejecting request with 401");
                (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_TOKEN",
                    "The access token is invalid or expired",
                    format!("Bearer realm=\"{AUTH_REALM}\", error=\"invalid_token\""),
                )
            }
            RsError::Forbidden(kind) => {
                tracing::debug!(target: "rs.errors", reason = kind.as_str(), "Rejecting request with 403");
                (
                    StatusCode::FORBIDDEN,
                    "INSUFFICIENT_SCOPE",
                    "The access token does not grant access to this resource",
                    format!("Bearer realm=\"{AUTH_REALM}\", error=\"insufficient_scope\""),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if let Ok(header_value) = HeaderValue::from_str(&challenge) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header_value);
        }

        response
    }
}
