//! Registry of explicitly trusted token issuers.
//!
//! # Security
//!
//! - Issuer lookup is exact and case-sensitive after trimming trailing slashes
//! - There is no default issuer: an unlisted `iss` is rejected
//! - Each issuer has its own key set; a key is never looked up across issuers

use crate::auth::jwks::{Jwk, JwksCacheSettings, JwksClient, JwksSource};
use crate::auth::AuthError;
use crate::config::TrustedIssuerConfig;
use common::jwt::normalize_issuer;
use std::collections::HashMap;

/// One trusted issuer and its key set.
pub struct TrustedIssuer {
    issuer: String,
    jwks: JwksClient,
}

impl TrustedIssuer {
    /// Normalized issuer identifier.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Look up a signing key in this issuer's key set, fetching it if absent
    /// or stale.
    ///
    /// # Errors
    ///
    /// `AuthError::UnknownKey` or `AuthError::KeyFetchError`.
    pub async fn signing_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        self.jwks.get_key(kid).await
    }
}

/// Immutable map of trusted issuers, built once at startup.
pub struct IssuerRegistry {
    issuers: HashMap<String, TrustedIssuer>,
}

impl IssuerRegistry {
    /// Build the registry. All issuers share one HTTP client.
    pub fn new(configs: &[TrustedIssuerConfig], settings: JwksCacheSettings) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(settings.fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                // Per-request timeouts still bound every fetch
                tracing::warn!(target: "rs.auth.issuer", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        let issuers = configs
            .iter()
            .map(|config| {
                let issuer = normalize_issuer(&config.issuer).to_string();
                let source = match &config.jwks_url {
                    Some(url) => JwksSource::Url(url.clone()),
                    None => JwksSource::Discovery,
                };
                let jwks = JwksClient::new(issuer.clone(), source, http_client.clone(), settings);
                (issuer.clone(), TrustedIssuer { issuer, jwks })
            })
            .collect();

        Self { issuers }
    }

    /// Find the trusted issuer matching an `iss` claim.
    pub fn resolve(&self, issuer_claim: &str) -> Option<&TrustedIssuer> {
        self.issuers.get(normalize_issuer(issuer_claim))
    }

    /// Look up `kid` in the key set of `issuer`.
    ///
    /// # Errors
    ///
    /// `AuthError::UnknownIssuer` if `issuer` is not trusted, otherwise the
    /// errors of [`TrustedIssuer::signing_key`].
    pub async fn signing_key(&self, issuer: &str, kid: &str) -> Result<Jwk, AuthError> {
        let trusted = self.resolve(issuer).ok_or(AuthError::UnknownIssuer)?;
        trusted.signing_key(kid).await
    }

    /// Trusted issuer identifiers, for startup logging.
    pub fn issuers(&self) -> impl Iterator<Item = &str> {
        self.issuers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.issuers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issuers.is_empty()
    }
}
