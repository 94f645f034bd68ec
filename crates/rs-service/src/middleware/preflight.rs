//! OPTIONS preflight handling.
//!
//! Every OPTIONS request is answered here, before authentication, so
//! browsers can preflight protected routes without credentials.

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Methods advertised in the `Allow` header of a preflight answer.
pub const ALLOWED_METHODS: &str = "GET, HEAD, POST, PUT, PATCH, DELETE, OPTIONS";

/// Answer OPTIONS with `204 No Content`; pass everything else through.
pub async fn handle_preflight(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }

    tracing::debug!(target: "rs.middleware.preflight", path = %request.uri().path(), "Answering preflight");
    (
        StatusCode::NO_CONTENT,
        [(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS))],
    )
        .into_response()
}
