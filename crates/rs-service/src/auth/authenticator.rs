//! Bearer token authentication pipeline.
//!
//! Turns an `Authorization` header into a [`Principal`] or exactly one
//! [`AuthError`]. The pipeline is linear and short-circuits on the first
//! failure:
//!
//! 1. Extract a well-formed `Bearer` token
//! 2. Peek at `alg`, `kid` and `iss` without verifying (size-checked first)
//! 3. Resolve `iss` against the trusted issuers; there is no fallback issuer
//! 4. Check the header algorithm against the allow-list
//! 5. Look up `kid` in the resolved issuer's key set (the only I/O)
//! 6. Verify the signature
//! 7. Check `exp` / `nbf` with clock skew, then the audience
//! 8. Build the claims and the principal

use crate::auth::issuer::IssuerRegistry;
use crate::auth::jwt::{
    allowed_algorithm, decoding_key, validate_audience, verify_signature,
    DEFAULT_ALLOWED_ALGORITHMS,
};
use crate::auth::{AuthError, Claims, Principal};
use crate::observability::metrics;
use common::jwt::{normalize_issuer, peek, validate_time_window, DEFAULT_CLOCK_SKEW};
use jsonwebtoken::Algorithm;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Token acceptance rules that do not depend on the issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Asymmetric algorithms a token header may name.
    pub allowed_algorithms: Vec<Algorithm>,
    /// Tolerance applied to both `exp` and `nbf`.
    pub clock_skew: Duration,
    /// Audience every token must carry, if set.
    pub audience: Option<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            allowed_algorithms: DEFAULT_ALLOWED_ALGORITHMS.to_vec(),
            clock_skew: DEFAULT_CLOCK_SKEW,
            audience: None,
        }
    }
}

/// Authenticates bearer tokens against the trusted issuers.
pub struct ResourceAuthenticator {
    registry: IssuerRegistry,
    policy: ValidationPolicy,
}

impl ResourceAuthenticator {
    pub fn new(registry: IssuerRegistry, policy: ValidationPolicy) -> Self {
        Self { registry, policy }
    }

    pub fn registry(&self) -> &IssuerRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Authenticate the value of an `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns the single [`AuthError`] that terminated the pipeline.
    #[instrument(skip_all)]
    pub async fn authenticate(
        &self,
        authorization_header: Option<&str>,
    ) -> Result<Principal, AuthError> {
        let start = Instant::now();

        let result = match extract_bearer_token(authorization_header) {
            Ok(token) => self.authenticate_token(token).await,
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.as_str(),
        };
        metrics::record_authentication(outcome, start.elapsed());

        match &result {
            Ok(principal) => {
                tracing::debug!(target: "rs.auth.authenticator", issuer = %principal.issuer(), "Token authenticated");
            }
            Err(e) => {
                tracing::debug!(target: "rs.auth.authenticator", reason = e.as_str(), "Token rejected");
            }
        }

        result
    }

    async fn authenticate_token(&self, token: &str) -> Result<Principal, AuthError> {
        let unverified = peek(token)?;

        let trusted = self.registry.resolve(&unverified.issuer).ok_or_else(|| {
            tracing::debug!(target: "rs.auth.authenticator", "Token issuer is not trusted");
            AuthError::UnknownIssuer
        })?;

        let alg = allowed_algorithm(&unverified.alg, &self.policy.allowed_algorithms)?;

        let kid = unverified.kid.as_deref().ok_or_else(|| {
            tracing::debug!(target: "rs.auth.authenticator", "Token header has no kid");
            AuthError::UnknownKey
        })?;
        let jwk = trusted.signing_key(kid).await?;

        let key = decoding_key(&jwk, alg)?;
        let payload = verify_signature(token, &key, alg)?;
        let claims = Claims::from_payload(payload)?;

        if normalize_issuer(&claims.iss) != trusted.issuer() {
            tracing::warn!(target: "rs.auth.authenticator", "Verified issuer differs from routed issuer");
            return Err(AuthError::UnknownIssuer);
        }

        validate_time_window(claims.exp, claims.nbf, self.policy.clock_skew)?;
        validate_audience(&claims.aud, self.policy.audience.as_deref())?;

        Ok(Principal::new(claims))
    }
}

/// Extract the token from a `Bearer <token68>` header value.
///
/// The scheme is case-insensitive.
///
/// # Errors
///
/// Returns `AuthError::MissingCredentials` if the header is absent, uses
/// another scheme, or does not carry a single token68 value.
pub fn extract_bearer_token(authorization_header: Option<&str>) -> Result<&str, AuthError> {
    let header = authorization_header.ok_or(AuthError::MissingCredentials)?;

    let (scheme, rest) = header.split_once(' ').ok_or_else(|| {
        tracing::debug!(target: "rs.auth.authenticator", "Authorization header has no credentials");
        AuthError::MissingCredentials
    })?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        tracing::debug!(target: "rs.auth.authenticator", "Authorization scheme is not Bearer");
        return Err(AuthError::MissingCredentials);
    }

    let token = rest.trim_start_matches(' ');
    if !is_token68(token) {
        tracing::debug!(target: "rs.auth.authenticator", "Bearer credentials are not a token68 value");
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

/// RFC 7235 token68: `1*( ALPHA / DIGIT / "-" / "." / "_" / "~" / "+" / "/" ) *"="`
fn is_token68(value: &str) -> bool {
    let body = value.trim_end_matches('=');
    !body.is_empty()
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'+' | b'/'))
}
