//! JWT claims structure.
//!
//! Contains the claims extracted from validated JWTs. The `sub` field is
//! redacted in Debug output to prevent exposure in logs.

use crate::auth::AuthError;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Validated JWT claims.
///
/// Built only from a payload whose signature has been verified. The typed
/// fields are the ones the resource server reasons about; `raw` keeps every
/// claim the issuer sent.
#[derive(Clone, PartialEq)]
pub struct Claims {
    /// Issuer, as presented in the token.
    pub iss: String,

    /// Subject (user_id or client_id) - redacted in Debug output.
    pub sub: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Not-before timestamp (Unix epoch seconds).
    pub nbf: Option<i64>,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: Option<i64>,

    /// Audiences, normalized from a string or an array.
    pub aud: Vec<String>,

    /// Granted scopes, normalized from `scope` or `scp`.
    pub scopes: BTreeSet<String>,

    raw: Map<String, Value>,
}

/// Custom Debug implementation that redacts the `sub` field.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("nbf", &self.nbf)
            .field("iat", &self.iat)
            .field("aud", &self.aud)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl Claims {
    /// Build claims from a verified payload.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedToken` when `iss`, `sub` or `exp` is
    /// missing or has the wrong type.
    pub fn from_payload(raw: Map<String, Value>) -> Result<Self, AuthError> {
        let iss = required_string(&raw, "iss")?;
        let sub = required_string(&raw, "sub")?;
        let exp = raw
            .get("exp")
            .and_then(numeric_date)
            .ok_or_else(|| malformed("exp"))?;
        let nbf = optional_numeric_date(&raw, "nbf")?;
        let iat = optional_numeric_date(&raw, "iat")?;
        let aud = string_or_list(raw.get("aud"));

        // `scope` wins; `scp` is the fallback some issuers use instead
        let scopes = match raw.get("scope") {
            Some(value) => scope_set(value),
            None => raw.get("scp").map(scope_set).unwrap_or_default(),
        };

        Ok(Self {
            iss,
            sub,
            exp,
            nbf,
            iat,
            aud,
            scopes,
            raw,
        })
    }

    /// Check if the token has a specific scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// Every claim of the verified payload.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

fn malformed(claim: &'static str) -> AuthError {
    tracing::debug!(target: "rs.auth.claims", claim, "Required claim missing or invalid");
    AuthError::MalformedToken
}

fn required_string(raw: &Map<String, Value>, claim: &'static str) -> Result<String, AuthError> {
    raw.get(claim)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| malformed(claim))
}

/// RFC 7519 NumericDate: integer or fractional seconds.
fn numeric_date(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

fn optional_numeric_date(
    raw: &Map<String, Value>,
    claim: &'static str,
) -> Result<Option<i64>, AuthError> {
    match raw.get(claim) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => numeric_date(value).map(Some).ok_or_else(|| malformed(claim)),
    }
}

fn string_or_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn scope_set(value: &Value) -> BTreeSet<String> {
    match value {
        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(str::split_whitespace)
            .map(str::to_string)
            .collect(),
        _ => BTreeSet::new(),
    }
}

/// An authenticated caller.
///
/// Inserted into request extensions by the auth middleware and read by
/// handlers and the scope guard. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Principal {
    claims: Arc<Claims>,
}

impl Principal {
    pub fn new(claims: Claims) -> Self {
        Self {
            claims: Arc::new(claims),
        }
    }

    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn issuer(&self) -> &str {
        &self.claims.iss
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}
