//! OIDC discovery for issuers configured without an explicit JWKS URL.

use crate::auth::jwks::fetch_json;
use crate::auth::AuthError;
use common::jwt::normalize_issuer;
use serde::Deserialize;
use std::time::Duration;

/// Well-known path of the OpenID Provider configuration document.
pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// The subset of OpenID Provider metadata the resource server needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub jwks_uri: String,
}

/// Discovery document URL for `issuer`.
pub fn discovery_url(issuer: &str) -> String {
    format!("{}{}", normalize_issuer(issuer), DISCOVERY_PATH)
}

/// Resolve the JWKS URL advertised by `issuer`.
///
/// The document's own `issuer` must match the configured one, otherwise a
/// provider could redirect key resolution to another issuer's keys.
///
/// # Errors
///
/// Returns `AuthError::KeyFetchError` if the document cannot be fetched,
/// parsed, or names a different issuer.
pub async fn discover_jwks_uri(
    http_client: &reqwest::Client,
    issuer: &str,
    timeout: Duration,
) -> Result<String, AuthError> {
    let url = discovery_url(issuer);
    tracing::debug!(target: "rs.auth.discovery", url = %url, "Fetching OIDC discovery document");

    let metadata: ProviderMetadata = fetch_json(http_client, &url, timeout).await?;

    if normalize_issuer(&metadata.issuer) != normalize_issuer(issuer) {
        tracing::error!(
            target: "rs.auth.discovery",
            configured = %issuer,
            advertised = %metadata.issuer,
            "Discovery document issuer mismatch"
        );
        return Err(AuthError::KeyFetchError);
    }
    if metadata.jwks_uri.is_empty() {
        tracing::error!(target: "rs.auth.discovery", issuer = %issuer, "Discovery document has empty jwks_uri");
        return Err(AuthError::KeyFetchError);
    }

    tracing::info!(
        target: "rs.auth.discovery",
        issuer = %issuer,
        jwks_uri = %metadata.jwks_uri,
        "Resolved JWKS URL via discovery"
    );
    Ok(metadata.jwks_uri)
}
