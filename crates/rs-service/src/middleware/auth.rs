//! Authentication and scope middleware for protected routes.
//!
//! `require_auth` turns the `Authorization` header into a [`Principal`] and
//! stores it in request extensions. `require_scope` runs after it and checks
//! the route's [`ScopeRequirement`] against that principal.

use crate::auth::{authorize, AuthError, Principal, ResourceAuthenticator, ScopeRequirement};
use crate::errors::RsError;
use crate::observability::metrics;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Arc<ResourceAuthenticator>,
}

/// Authentication middleware that validates bearer tokens.
///
/// # Response
///
/// - Returns 401 Unauthorized with a `WWW-Authenticate` challenge if the token
///   is missing or invalid
/// - Continues to the next handler with the principal in extensions otherwise
#[instrument(skip_all, name = "rs.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, RsError> {
    // A non-ASCII header value is treated like an absent one
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let principal = state.authenticator.authenticate(auth_header).await?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Scope guard bound to one route's requirement.
///
/// Must be layered inside `require_auth`. A request that reaches it without a
/// principal is rejected as unauthenticated.
#[instrument(skip_all, name = "rs.middleware.scope")]
pub async fn require_scope(
    State(requirement): State<Arc<ScopeRequirement>>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, RsError> {
    let Some(principal) = req.principal() else {
        tracing::warn!(target: "rs.middleware.auth", "Scope guard reached without a principal");
        return Err(RsError::Unauthorized(AuthError::MissingCredentials));
    };

    let decision = authorize(principal.claims(), &requirement);
    metrics::record_scope_decision(decision.is_ok());
    decision?;

    Ok(next.run(req).await)
}

/// Extension trait for extracting the principal from a request.
pub trait PrincipalExt {
    /// Returns `None` if the auth middleware was not applied to this request.
    fn principal(&self) -> Option<&Principal>;
}

impl<B> PrincipalExt for axum::extract::Request<B> {
    fn principal(&self) -> Option<&Principal> {
        self.extensions().get::<Principal>()
    }
}
