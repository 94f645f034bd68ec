//! JWT signature verification primitives.
//!
//! # Security
//!
//! - Only asymmetric algorithms are ever accepted: `none` and every HMAC
//!   algorithm are rejected before any key is touched
//! - The header algorithm must be on the configured allow-list
//! - The JWK's key type (and its `alg`, when pinned) must agree with the
//!   header algorithm, so an RSA key can never verify an EdDSA token
//! - Temporal and audience checks are done by the caller with explicit skew;
//!   `jsonwebtoken` only verifies the signature here

use crate::auth::jwks::Jwk;
use crate::auth::AuthError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Algorithms accepted when none are configured.
pub const DEFAULT_ALLOWED_ALGORITHMS: &[Algorithm] =
    &[Algorithm::RS256, Algorithm::ES256, Algorithm::EdDSA];

/// True for algorithms verified with a public key.
pub fn is_asymmetric(alg: Algorithm) -> bool {
    !matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

/// Canonical JOSE name of an algorithm.
pub fn algorithm_name(alg: Algorithm) -> &'static str {
    match alg {
        Algorithm::HS256 => "HS256",
        Algorithm::HS384 => "HS384",
        Algorithm::HS512 => "HS512",
        Algorithm::RS256 => "RS256",
        Algorithm::RS384 => "RS384",
        Algorithm::RS512 => "RS512",
        Algorithm::PS256 => "PS256",
        Algorithm::PS384 => "PS384",
        Algorithm::PS512 => "PS512",
        Algorithm::ES256 => "ES256",
        Algorithm::ES384 => "ES384",
        Algorithm::EdDSA => "EdDSA",
    }
}

/// Check a header `alg` against the allow-list.
///
/// # Errors
///
/// Returns `AuthError::AlgorithmNotAllowed` for `none`, HMAC, unknown
/// algorithm names, and anything not in `allowed`.
pub fn allowed_algorithm(name: &str, allowed: &[Algorithm]) -> Result<Algorithm, AuthError> {
    let alg = Algorithm::from_str(name).map_err(|_| {
        tracing::debug!(target: "rs.auth.jwt", alg = %name, "Unrecognized token algorithm");
        AuthError::AlgorithmNotAllowed
    })?;

    if !is_asymmetric(alg) || !allowed.contains(&alg) {
        tracing::debug!(target: "rs.auth.jwt", alg = %name, "Token algorithm not allowed");
        return Err(AuthError::AlgorithmNotAllowed);
    }

    Ok(alg)
}

/// Build the decoding key for `alg` from a JWK.
///
/// # Errors
///
/// Returns `AuthError::SignatureInvalid` if the key cannot be used with
/// `alg` or its material is missing or invalid.
pub fn decoding_key(jwk: &Jwk, alg: Algorithm) -> Result<DecodingKey, AuthError> {
    let mismatch = |reason: &'static str| {
        tracing::warn!(
            target: "rs.auth.jwt",
            kid = %jwk.kid,
            kty = %jwk.kty,
            alg = algorithm_name(alg),
            reason,
            "JWK cannot verify token"
        );
        AuthError::SignatureInvalid
    };

    if let Some(pinned) = &jwk.alg {
        if pinned != algorithm_name(alg) {
            return Err(mismatch("jwk alg differs from token alg"));
        }
    }

    let result = match alg {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => {
            if jwk.kty != "RSA" {
                return Err(mismatch("key type is not RSA"));
            }
            let (Some(n), Some(e)) = (&jwk.n, &jwk.e) else {
                return Err(mismatch("RSA key missing n or e"));
            };
            DecodingKey::from_rsa_components(n, e)
        }
        Algorithm::ES256 | Algorithm::ES384 => {
            let curve = if alg == Algorithm::ES256 { "P-256" } else { "P-384" };
            if jwk.kty != "EC" || jwk.crv.as_deref() != Some(curve) {
                return Err(mismatch("key is not on the algorithm's curve"));
            }
            let (Some(x), Some(y)) = (&jwk.x, &jwk.y) else {
                return Err(mismatch("EC key missing x or y"));
            };
            DecodingKey::from_ec_components(x, y)
        }
        Algorithm::EdDSA => {
            if jwk.kty != "OKP" || jwk.crv.as_deref() != Some("Ed25519") {
                return Err(mismatch("key is not an Ed25519 key"));
            }
            let Some(x) = &jwk.x else {
                return Err(mismatch("OKP key missing x"));
            };
            DecodingKey::from_ed_components(x)
        }
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            return Err(mismatch("symmetric algorithm"));
        }
    };

    result.map_err(|e| {
        tracing::warn!(target: "rs.auth.jwt", kid = %jwk.kid, error = %e, "Invalid JWK key material");
        AuthError::SignatureInvalid
    })
}

/// Verify the token signature and return the payload claims.
///
/// # Errors
///
/// Returns `AuthError::SignatureInvalid` for a bad signature and
/// `AuthError::MalformedToken` if the token cannot be decoded.
pub fn verify_signature(
    token: &str,
    key: &DecodingKey,
    alg: Algorithm,
) -> Result<Map<String, Value>, AuthError> {
    let mut validation = Validation::new(alg);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Map<String, Value>>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(target: "rs.auth.jwt", error = %e, "Token verification failed");
            match e.kind() {
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => AuthError::MalformedToken,
                _ => AuthError::SignatureInvalid,
            }
        })
}

/// Require `expected` among the token audiences when an audience is configured.
///
/// # Errors
///
/// Returns `AuthError::AudienceMismatch` if it is absent.
pub fn validate_audience(aud: &[String], expected: Option<&str>) -> Result<(), AuthError> {
    match expected {
        Some(expected) if !aud.iter().any(|a| a == expected) => {
            tracing::debug!(target: "rs.auth.jwt", expected = %expected, "Token audience mismatch");
            Err(AuthError::AudienceMismatch)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn okp_jwk(alg: Option<&str>) -> Jwk {
        Jwk {
            kty: "OKP".to_string(),
            kid: "test-key".to_string(),
            alg: alg.map(str::to_string),
            key_use: Some("sig".to_string()),
            crv: Some("Ed25519".to_string()),
            // 32 zero bytes
            x: Some("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".to_string()),
            y: None,
            n: None,
            e: None,
        }
    }

    fn rsa_jwk() -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: "rsa-key".to_string(),
            alg: None,
            key_use: None,
            crv: None,
            x: None,
            y: None,
            n: Some("rN9GewGOQXWx9PsLCPtuNgiqWsAhoK7n_JvIIRLhM6JFlIK2k8B-Mv_F1aYu4Bb1-c5iBA1aOGAJ1GknwuO5vYYHyuNGtBDFcqjzBxsiijTj_HkTerFUshPz_jUeDjANaAGNxG3UQZ1_axFQ3U2OMwAnr5VafOh_E2simxj7VX9Qi5zojDHIilicuuQ2GhGo4kXOoqGSN4_NdMJQxbORl5aDD57B0_AnH8dXohMUY8tjMSbFOv7P8Ffzot5k1wuxqOdqiTK_PWu68J1DlCmXqw01v5HHGOw_MK0iKWAgazuxAnwNhIgf9mwITbnzhx0wB9-JCouLAWAqW39usOdiFQ".to_string()),
            e: Some("AQAB".to_string()),
        }
    }

    #[test]
    fn test_allowed_algorithm_accepts_listed() {
        let alg = allowed_algorithm("RS256", DEFAULT_ALLOWED_ALGORITHMS).unwrap();
        assert_eq!(alg, Algorithm::RS256);
        assert_eq!(
            allowed_algorithm("EdDSA", DEFAULT_ALLOWED_ALGORITHMS).unwrap(),
            Algorithm::EdDSA
        );
    }

    #[test]
    fn test_allowed_algorithm_rejects_none_and_hmac() {
        for name in ["none", "None", "HS256", "HS384", "HS512", "", "RS1"] {
            assert_eq!(
                allowed_algorithm(name, DEFAULT_ALLOWED_ALGORITHMS),
                Err(AuthError::AlgorithmNotAllowed),
                "{name} must not be accepted"
            );
        }
    }

    #[test]
    fn test_allowed_algorithm_rejects_hmac_even_if_listed() {
        assert_eq!(
            allowed_algorithm("HS256", &[Algorithm::HS256, Algorithm::RS256]),
            Err(AuthError::AlgorithmNotAllowed)
        );
    }

    #[test]
    fn test_allowed_algorithm_rejects_unlisted_asymmetric() {
        assert_eq!(
            allowed_algorithm("PS256", DEFAULT_ALLOWED_ALGORITHMS),
            Err(AuthError::AlgorithmNotAllowed)
        );
        assert_eq!(
            allowed_algorithm("RS256", &[Algorithm::EdDSA]),
            Err(AuthError::AlgorithmNotAllowed)
        );
    }

    #[test]
    fn test_algorithm_name_round_trips_through_from_str() {
        for alg in [
            Algorithm::RS256,
            Algorithm::PS512,
            Algorithm::ES384,
            Algorithm::EdDSA,
        ] {
            assert_eq!(Algorithm::from_str(algorithm_name(alg)).unwrap(), alg);
        }
    }

    #[test]
    fn test_decoding_key_okp() {
        assert!(decoding_key(&okp_jwk(Some("EdDSA")), Algorithm::EdDSA).is_ok());
        assert!(decoding_key(&okp_jwk(None), Algorithm::EdDSA).is_ok());
    }

    #[test]
    fn test_decoding_key_rsa() {
        assert!(decoding_key(&rsa_jwk(), Algorithm::RS256).is_ok());
        assert!(decoding_key(&rsa_jwk(), Algorithm::PS256).is_ok());
    }

    #[test]
    fn test_decoding_key_rejects_key_type_confusion() {
        assert_eq!(
            decoding_key(&rsa_jwk(), Algorithm::EdDSA).err(),
            Some(AuthError::SignatureInvalid)
        );
        assert_eq!(
            decoding_key(&okp_jwk(None), Algorithm::RS256).err(),
            Some(AuthError::SignatureInvalid)
        );
        assert_eq!(
            decoding_key(&okp_jwk(None), Algorithm::ES256).err(),
            Some(AuthError::SignatureInvalid)
        );
    }

    #[test]
    fn test_decoding_key_rejects_pinned_alg_mismatch() {
        let mut jwk = rsa_jwk();
        jwk.alg = Some("RS512".to_string());

        assert_eq!(
            decoding_key(&jwk, Algorithm::RS256).err(),
            Some(AuthError::SignatureInvalid)
        );
    }

    #[test]
    fn test_decoding_key_rejects_missing_material() {
        let mut jwk = rsa_jwk();
        jwk.n = None;
        assert_eq!(
            decoding_key(&jwk, Algorithm::RS256).err(),
            Some(AuthError::SignatureInvalid)
        );

        let mut jwk = okp_jwk(None);
        jwk.x = None;
        assert_eq!(
            decoding_key(&jwk, Algorithm::EdDSA).err(),
            Some(AuthError::SignatureInvalid)
        );
    }

    #[test]
    fn test_verify_signature_rejects_garbage_signature() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"EdDSA","typ":"JWT","kid":"test-key"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"iss":"https://a","sub":"u","exp":9999999999}"#);
        let signature = URL_SAFE_NO_PAD.encode([7u8; 64]);
        let token = format!("{header}.{payload}.{signature}");

        let key = decoding_key(&okp_jwk(None), Algorithm::EdDSA).unwrap();

        assert_eq!(
            verify_signature(&token, &key, Algorithm::EdDSA),
            Err(AuthError::SignatureInvalid)
        );
    }

    #[test]
    fn test_validate_audience() {
        let aud = vec!["api://one".to_string(), "api://two".to_string()];

        assert!(validate_audience(&aud, None).is_ok());
        assert!(validate_audience(&aud, Some("api://two")).is_ok());
        assert_eq!(
            validate_audience(&aud, Some("api://three")),
            Err(AuthError::AudienceMismatch)
        );
        assert_eq!(
            validate_audience(&[], Some("api://one")),
            Err(AuthError::AudienceMismatch)
        );
        assert!(validate_audience(&[], None).is_ok());
    }
}
