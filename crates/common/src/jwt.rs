//! JWT utilities shared across resource server components.
//!
//! This module provides the transport-agnostic pieces of bearer token
//! validation:
//! - Size limits for DoS prevention
//! - Clock skew bounds for temporal validation
//! - Unverified peek at the header (`alg`, `kid`) and the `iss` claim
//! - Issuer identifier normalization
//! - `exp` / `nbf` window validation
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing returned by [`peek`] is trustworthy until the signature has been
//!   verified; it is only fit for routing (issuer lookup, key lookup)
//! - Generic error messages prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{peek, validate_time_window, DEFAULT_CLOCK_SKEW};
//!
//! let unverified = peek(token)?;
//! let issuer = registry.resolve(&unverified.issuer)?;
//! // ... verify signature with a key from `issuer` ...
//! validate_time_window(claims.exp, claims.nbf, DEFAULT_CLOCK_SKEW)?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this are rejected BEFORE any base64 decoding or
/// cryptographic work.
///
/// - Typical access tokens are 600-1500 bytes (RS256 signature, OIDC claims)
/// - 8KB leaves room for large scope lists while bounding allocation per request
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default JWT clock skew tolerance (60 seconds).
///
/// Applied to both ends of the validity window: a token is still accepted up
/// to this long after `exp`, and this long before `nbf`.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Maximum allowed JWT clock skew tolerance (10 minutes).
///
/// Configuration above this value is rejected at startup.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur in the transport-agnostic JWT helpers.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid compact JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token payload carries no `iss` claim.
    #[error("The access token is invalid or expired")]
    MissingIssuer,

    /// Current time is at or past `exp` plus the clock skew.
    #[error("The access token is invalid or expired")]
    Expired,

    /// Current time is before `nbf` minus the clock skew.
    #[error("The access token is invalid or expired")]
    NotYetValid,
}

// =============================================================================
// Unverified peek
// =============================================================================

/// Routing information read from a token WITHOUT verifying its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedToken {
    /// Header `alg` value, exactly as presented (may be `none`).
    pub alg: String,

    /// Header `kid` value. Empty strings are treated as absent.
    pub kid: Option<String>,

    /// Payload `iss` value, exactly as presented.
    pub issuer: String,
}

#[derive(Deserialize)]
struct PeekHeader {
    alg: String,
    #[serde(default)]
    kid: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct PeekPayload {
    #[serde(default)]
    iss: Option<serde_json::Value>,
}

/// Read `alg`, `kid` and `iss` from a compact JWT without verifying it.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing (denial-of-service prevention)
/// - This function does NOT validate the token signature
/// - The returned values may only be used to select a trusted issuer and a
///   key from that issuer's own key set
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Not three dot-separated segments, bad base64url,
///   header/payload not JSON objects, or `alg` missing
/// - `MissingIssuer` - Payload has no string `iss` claim
pub fn peek(token: &str) -> Result<UnverifiedToken, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let mut parts = token.split('.');
    let (Some(header_part), Some(payload_part), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
        return Err(JwtValidationError::MalformedToken);
    };

    let header: PeekHeader = decode_segment(header_part, "header")?;
    let payload: PeekPayload = decode_segment(payload_part, "payload")?;

    let kid = match header.kid {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(kid)) if kid.is_empty() => None,
        Some(serde_json::Value::String(kid)) => Some(kid),
        Some(_) => {
            tracing::debug!(target: "common.jwt", "Token rejected: kid is not a string");
            return Err(JwtValidationError::MalformedToken);
        }
    };

    let issuer = match payload.iss {
        Some(serde_json::Value::String(iss)) if !iss.is_empty() => iss,
        _ => {
            tracing::debug!(target: "common.jwt", "Token rejected: missing iss claim");
            return Err(JwtValidationError::MissingIssuer);
        }
    };

    Ok(UnverifiedToken {
        alg: header.alg,
        kid,
        issuer,
    })
}

fn decode_segment<T: serde::de::DeserializeOwned>(
    segment: &str,
    name: &'static str,
) -> Result<T, JwtValidationError> {
    if segment.is_empty() {
        tracing::debug!(target: "common.jwt", segment = name, "Empty JWT segment");
        return Err(JwtValidationError::MalformedToken);
    }

    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", segment = name, error = %e, "Failed to decode JWT base64");
        JwtValidationError::MalformedToken
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", segment = name, error = %e, "Failed to parse JWT JSON");
        JwtValidationError::MalformedToken
    })
}

// =============================================================================
// Issuer identifiers
// =============================================================================

/// Normalize an issuer identifier for comparison.
///
/// Only trailing slashes are trimmed; matching stays exact and case-sensitive.
/// The same normalization must be applied to configured issuers and to
/// presented `iss` claims.
#[must_use]
pub fn normalize_issuer(issuer: &str) -> &str {
    issuer.trim_end_matches('/')
}

// =============================================================================
// Temporal validation
// =============================================================================

/// Validate `exp` and optional `nbf` against the current time.
///
/// A token is valid when `nbf - skew <= now < exp + skew`.
///
/// # Errors
///
/// - `Expired` - `now >= exp + clock_skew`
/// - `NotYetValid` - `now < nbf - clock_skew`
pub fn validate_time_window(
    exp: i64,
    nbf: Option<i64>,
    clock_skew: Duration,
) -> Result<(), JwtValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_time_window_at(exp, nbf, clock_skew, now)
}

/// Deterministic window validation against an explicit `now` timestamp.
///
/// Prefer [`validate_time_window`] in production code. This variant exists so
/// that boundary conditions can be tested without wall-clock dependence.
///
/// # Errors
///
/// Same as [`validate_time_window`].
pub fn validate_time_window_at(
    exp: i64,
    nbf: Option<i64>,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    // Safe cast: clock_skew is bounded to MAX_CLOCK_SKEW (600 seconds) by config
    #[allow(clippy::cast_possible_wrap)]
    let skew = clock_skew.as_secs() as i64;

    if now >= exp.saturating_add(skew) {
        tracing::debug!(
            target: "common.jwt",
            exp = exp,
            now = now,
            clock_skew_secs = skew,
            "Token rejected: expired"
        );
        return Err(JwtValidationError::Expired);
    }

    if let Some(nbf) = nbf {
        if now < nbf.saturating_sub(skew) {
            tracing::debug!(
                target: "common.jwt",
                nbf = nbf,
                now = now,
                clock_skew_secs = skew,
                "Token rejected: not yet valid"
            );
            return Err(JwtValidationError::NotYetValid);
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn token_from(header: &str, payload: &str) -> String {
        format!(
            "{}.{}.c2lnbmF0dXJl",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    // -------------------------------------------------------------------------
    // Constants Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_max_jwt_size_is_8kb() {
        assert_eq!(MAX_JWT_SIZE_BYTES, 8192);
    }

    #[test]
    fn test_default_clock_skew_within_max() {
        assert!(DEFAULT_CLOCK_SKEW <= MAX_CLOCK_SKEW);
        assert_eq!(MAX_CLOCK_SKEW, Duration::from_secs(600));
    }

    // -------------------------------------------------------------------------
    // peek Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_peek_valid_token() {
        let token = token_from(
            r#"{"alg":"RS256","typ":"JWT","kid":"key-1"}"#,
            r#"{"iss":"https://issuer.example.com","sub":"alice"}"#,
        );

        let unverified = peek(&token).unwrap();
        assert_eq!(unverified.alg, "RS256");
        assert_eq!(unverified.kid.as_deref(), Some("key-1"));
        assert_eq!(unverified.issuer, "https://issuer.example.com");
    }

    #[test]
    fn test_peek_keeps_alg_none_for_caller_to_reject() {
        let token = token_from(r#"{"alg":"none"}"#, r#"{"iss":"https://a.example"}"#);

        let unverified = peek(&token).unwrap();
        assert_eq!(unverified.alg, "none");
        assert!(unverified.kid.is_none());
    }

    #[test]
    fn test_peek_empty_kid_is_absent() {
        let token = token_from(
            r#"{"alg":"EdDSA","kid":""}"#,
            r#"{"iss":"https://a.example"}"#,
        );
        assert!(peek(&token).unwrap().kid.is_none());
    }

    #[test]
    fn test_peek_numeric_kid_rejected() {
        let token = token_from(
            r#"{"alg":"EdDSA","kid":12345}"#,
            r#"{"iss":"https://a.example"}"#,
        );
        assert_eq!(peek(&token), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_peek_missing_issuer() {
        let token = token_from(r#"{"alg":"EdDSA","kid":"k"}"#, r#"{"sub":"alice"}"#);
        assert_eq!(peek(&token), Err(JwtValidationError::MissingIssuer));
    }

    #[test]
    fn test_peek_non_string_issuer() {
        let token = token_from(r#"{"alg":"EdDSA","kid":"k"}"#, r#"{"iss":42}"#);
        assert_eq!(peek(&token), Err(JwtValidationError::MissingIssuer));
    }

    #[test]
    fn test_peek_wrong_segment_count() {
        assert_eq!(peek("only.two"), Err(JwtValidationError::MalformedToken));
        assert_eq!(
            peek("not.a.valid.jwt"),
            Err(JwtValidationError::MalformedToken)
        );
        assert_eq!(peek(""), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_peek_invalid_base64() {
        assert_eq!(
            peek("!!!invalid!!!.payload.signature"),
            Err(JwtValidationError::MalformedToken)
        );
    }

    #[test]
    fn test_peek_header_without_alg() {
        let token = token_from(r#"{"typ":"JWT"}"#, r#"{"iss":"https://a.example"}"#);
        assert_eq!(peek(&token), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_peek_payload_not_json() {
        let token = format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"EdDSA"}"#),
            URL_SAFE_NO_PAD.encode("not-json")
        );
        assert_eq!(peek(&token), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_peek_oversized_token() {
        let token = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert_eq!(peek(&token), Err(JwtValidationError::TokenTooLarge));
    }

    // -------------------------------------------------------------------------
    // normalize_issuer Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_normalize_issuer_trims_trailing_slashes() {
        assert_eq!(
            normalize_issuer("https://issuer.example.com/"),
            "https://issuer.example.com"
        );
        assert_eq!(
            normalize_issuer("https://issuer.example.com//"),
            "https://issuer.example.com"
        );
    }

    #[test]
    fn test_normalize_issuer_is_case_sensitive() {
        assert_ne!(
            normalize_issuer("https://Issuer.example.com"),
            normalize_issuer("https://issuer.example.com")
        );
    }

    // -------------------------------------------------------------------------
    // validate_time_window Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_window_valid_token() {
        let now = 1_700_000_000;
        assert!(validate_time_window_at(now + 3600, None, Duration::ZERO, now).is_ok());
    }

    #[test]
    fn test_window_expired_exactly_at_exp_without_skew() {
        let now = 1_700_000_000;
        assert_eq!(
            validate_time_window_at(now, None, Duration::ZERO, now),
            Err(JwtValidationError::Expired)
        );
    }

    #[test]
    fn test_window_skew_boundary() {
        let now = 1_700_000_000;
        let skew = Duration::from_secs(60);

        // Expired 59 seconds ago: still inside the tolerance
        assert!(validate_time_window_at(now - 59, None, skew, now).is_ok());
        // Expired exactly skew seconds ago: rejected
        assert_eq!(
            validate_time_window_at(now - 60, None, skew, now),
            Err(JwtValidationError::Expired)
        );
        // One second beyond the tolerance
        assert_eq!(
            validate_time_window_at(now - 61, None, skew, now),
            Err(JwtValidationError::Expired)
        );
    }

    #[test]
    fn test_window_not_yet_valid() {
        let now = 1_700_000_000;
        let skew = Duration::from_secs(60);

        assert_eq!(
            validate_time_window_at(now + 3600, Some(now + 61), skew, now),
            Err(JwtValidationError::NotYetValid)
        );
        assert!(validate_time_window_at(now + 3600, Some(now + 60), skew, now).is_ok());
        assert!(validate_time_window_at(now + 3600, Some(now), Duration::ZERO, now).is_ok());
    }

    #[test]
    fn test_window_expiry_checked_before_nbf() {
        let now = 1_700_000_000;
        assert_eq!(
            validate_time_window_at(now - 10, Some(now + 10), Duration::ZERO, now),
            Err(JwtValidationError::Expired)
        );
    }
}
