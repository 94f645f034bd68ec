//! Builder patterns for test token construction
//!
//! Provides a fluent API for minting signed tokens, plus helpers for tokens
//! that no honest issuer would produce (unsigned, `alg: none`, HMAC).

use crate::crypto_fixtures::{ec_encoding_key, rsa_encoding_key, TestKeypair};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for creating test JWT claims and signed tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new("https://issuer.example.com")
///     .for_user("alice")
///     .with_scope("openid profile")
///     .expires_in(3600)
///     .sign_ed25519(&keypair);
/// ```
#[derive(Debug, Clone)]
pub struct TestTokenBuilder {
    claims: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a builder for `issuer` with a subject and a one hour lifetime.
    pub fn new(issuer: &str) -> Self {
        let now = Utc::now();
        let mut claims = Map::new();
        claims.insert("iss".to_string(), json!(issuer));
        claims.insert("sub".to_string(), json!("test-subject"));
        claims.insert("iat".to_string(), json!(now.timestamp()));
        claims.insert(
            "exp".to_string(),
            json!((now + Duration::seconds(3600)).timestamp()),
        );
        Self { claims }
    }

    /// Set the subject (user/service)
    pub fn for_user(self, subject: &str) -> Self {
        self.with_claim("sub", json!(subject))
    }

    /// Set the `scope` claim (space-separated)
    pub fn with_scope(self, scope: &str) -> Self {
        self.with_claim("scope", json!(scope))
    }

    /// Set the `scp` claim as an array
    pub fn with_scp(self, scopes: &[&str]) -> Self {
        self.with_claim("scp", json!(scopes))
    }

    /// Set the audience
    pub fn with_audience(self, aud: Value) -> Self {
        self.with_claim("aud", aud)
    }

    /// Set expiration in seconds from now (negative for the past)
    pub fn expires_in(self, seconds: i64) -> Self {
        self.with_claim("exp", json!((Utc::now() + Duration::seconds(seconds)).timestamp()))
    }

    /// Set not-before in seconds from now
    pub fn not_before_in(self, seconds: i64) -> Self {
        self.with_claim("nbf", json!((Utc::now() + Duration::seconds(seconds)).timestamp()))
    }

    /// Set any claim
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Remove a claim
    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    /// Build the claims as a JSON value
    pub fn build(&self) -> Value {
        Value::Object(self.claims.clone())
    }

    /// Sign with an explicit algorithm, key id and key.
    pub fn sign(&self, alg: Algorithm, kid: Option<&str>, key: &EncodingKey) -> String {
        let mut header = Header::new(alg);
        header.kid = kid.map(str::to_string);
        encode(&header, &self.claims, key).expect("test token must encode")
    }

    /// Sign as EdDSA with a seeded keypair.
    pub fn sign_ed25519(&self, keypair: &TestKeypair) -> String {
        self.sign(Algorithm::EdDSA, Some(&keypair.kid), &keypair.encoding_key())
    }

    /// Sign with the fixed RSA key (RS256).
    pub fn sign_rsa(&self, kid: &str) -> String {
        self.sign(Algorithm::RS256, Some(kid), &rsa_encoding_key())
    }

    /// Sign with the fixed P-256 key (ES256).
    pub fn sign_ec(&self, kid: &str) -> String {
        self.sign(Algorithm::ES256, Some(kid), &ec_encoding_key())
    }

    /// Sign with HS256 using `secret`.
    pub fn sign_hs256(&self, kid: &str, secret: &[u8]) -> String {
        self.sign(Algorithm::HS256, Some(kid), &EncodingKey::from_secret(secret))
    }

    /// Build an `alg: none` token with an empty signature.
    pub fn unsigned(&self, kid: &str) -> String {
        unsigned_token(&json!({"alg": "none", "typ": "JWT", "kid": kid}), &self.build())
    }
}

/// Assemble a compact JWT from raw header and payload JSON, with an empty
/// signature segment.
pub fn unsigned_token(header: &Value, payload: &Value) -> String {
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

/// Replace the payload of a signed token, keeping header and signature.
pub fn tamper_payload(token: &str, payload: &Value) -> String {
    let mut parts = token.split('.');
    let header = parts.next().unwrap_or_default();
    let _ = parts.next();
    let signature = parts.next().unwrap_or_default();
    format!(
        "{}.{}.{}",
        header,
        URL_SAFE_NO_PAD.encode(payload.to_string()),
        signature
    )
}
