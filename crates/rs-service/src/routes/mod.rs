//! HTTP routes for the resource server.
//!
//! Defines the Axum router. Scope requirements are bound here, per route.

use crate::auth::{ResourceAuthenticator, ScopeRequirement};
use crate::handlers;
use crate::middleware::{
    handle_preflight, http_metrics_middleware, require_auth, require_scope, AuthState,
};
use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Request timeout applied to every route.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/actuator/health` - Liveness probe - public
/// - `/actuator/prometheus` - Prometheus metrics endpoint - public
/// - `/api/jwt/info` - Verified claims of the caller - requires authentication
/// - `/api/sample/protected/openidscope` - requires scope `openid`
/// - `/api/sample/protected/nonexistentscope` - requires scope `nonexistent`
/// - OPTIONS on any path answered before authentication
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(
    authenticator: Arc<ResourceAuthenticator>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let auth_state = Arc::new(AuthState { authenticator });

    // Public routes (no authentication required)
    let public_routes = Router::new().route("/actuator/health", get(handlers::health_check));

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/actuator/prometheus", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (authentication required; scope guards run inside auth)
    let protected_routes = Router::new()
        .route("/api/jwt/info", get(handlers::jwt_info))
        .merge(scoped_route(
            "/api/sample/protected/openidscope",
            ScopeRequirement::scope("openid"),
        ))
        .merge(scoped_route(
            "/api/sample/protected/nonexistentscope",
            ScopeRequirement::scope("nonexistent"),
        ))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth));

    // Merge routes and apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. handle_preflight - Answer OPTIONS before any auth (innermost)
    // 2. TimeoutLayer - Timeout the request
    // 3. TraceLayer - Log request details
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(handle_preflight))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// A sample route guarded by `requirement`, accepting any method.
fn scoped_route(path: &str, requirement: ScopeRequirement) -> Router {
    Router::new()
        .route(path, any(handlers::scope_protected))
        .route_layer(middleware::from_fn_with_state(
            Arc::new(requirement),
            require_scope,
        ))
}
