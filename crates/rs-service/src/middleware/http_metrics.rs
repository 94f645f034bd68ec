//! HTTP metrics middleware for capturing all request/response metrics
//!
//! Captures every response, including those produced before a handler runs:
//! - 401 / 403 from the auth middleware
//! - 404 Not Found
//! - 405 Method Not Allowed
//! - 204 preflight answers

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Middleware that records HTTP request metrics for all responses
///
/// Applied as the outermost layer so rejected requests are counted too.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn handler_200() -> &'static str {
        "OK"
    }

    async fn handler_401() -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn test_app() -> Router {
        Router::new()
            .route("/actuator/health", get(handler_200))
            .route("/api/jwt/info", get(handler_401))
            .layer(middleware::from_fn(http_metrics_middleware))
    }

    async fn status_of(uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("request builder should succeed");

        test_app()
            .oneshot(request)
            .await
            .expect("request should succeed")
            .status()
    }

    #[tokio::test]
    async fn test_middleware_passes_through_success() {
        assert_eq!(status_of("/actuator/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_passes_through_rejection() {
        assert_eq!(status_of("/api/jwt/info").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_middleware_records_not_found() {
        assert_eq!(status_of("/nonexistent").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_middleware_records_extension_method() {
        let request = HttpRequest::builder()
            .method("PROPFIND")
            .uri("/actuator/health")
            .body(Body::empty())
            .expect("request builder should succeed");

        let response = test_app()
            .oneshot(request)
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
