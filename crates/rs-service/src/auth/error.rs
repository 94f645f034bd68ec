//! Authentication and authorization failure kinds.
//!
//! Every variant is terminal for the request it occurred in. The `Display`
//! text is for server-side logs only; clients receive the generic messages
//! produced by [`crate::errors::RsError`].

use common::jwt::JwtValidationError;
use thiserror::Error;

/// Why a request was not authenticated or not authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing or malformed bearer credentials")]
    MissingCredentials,

    #[error("token is not a well-formed JWT")]
    MalformedToken,

    #[error("token issuer is not trusted")]
    UnknownIssuer,

    #[error("token key id not found in issuer key set")]
    UnknownKey,

    #[error("token signature verification failed")]
    SignatureInvalid,

    #[error("token algorithm is not allowed")]
    AlgorithmNotAllowed,

    #[error("token has expired")]
    TokenExpired,

    #[error("token is not yet valid")]
    TokenNotYetValid,

    #[error("token audience does not match")]
    AudienceMismatch,

    #[error("issuer key set could not be fetched")]
    KeyFetchError,

    #[error("token lacks a required scope")]
    InsufficientScope,
}

impl AuthError {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnknownIssuer => "unknown_issuer",
            AuthError::UnknownKey => "unknown_key",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::AlgorithmNotAllowed => "algorithm_not_allowed",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::AudienceMismatch => "audience_mismatch",
            AuthError::KeyFetchError => "key_fetch_error",
            AuthError::InsufficientScope => "insufficient_scope",
        }
    }

    /// True for authorization failures on an otherwise authenticated request.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, AuthError::InsufficientScope)
    }
}

impl From<JwtValidationError> for AuthError {
    fn from(err: JwtValidationError) -> Self {
        match err {
            JwtValidationError::TokenTooLarge
            | JwtValidationError::MalformedToken
            | JwtValidationError::MissingIssuer => AuthError::MalformedToken,
            JwtValidationError::Expired => AuthError::TokenExpired,
            JwtValidationError::NotYetValid => AuthError::TokenNotYetValid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_unique() {
        let all = [
            AuthError::MissingCredentials,
            AuthError::MalformedToken,
            AuthError::UnknownIssuer,
            AuthError::UnknownKey,
            AuthError::SignatureInvalid,
            AuthError::AlgorithmNotAllowed,
            AuthError::TokenExpired,
            AuthError::TokenNotYetValid,
            AuthError::AudienceMismatch,
            AuthError::KeyFetchError,
            AuthError::InsufficientScope,
        ];
        let labels: std::collections::HashSet<_> = all.iter().map(AuthError::as_str).collect();
        assert_eq!(labels.len(), all.len());
    }

    #[test]
    fn test_only_insufficient_scope_is_authorization_failure() {
        assert!(AuthError::InsufficientScope.is_authorization_failure());
        assert!(!AuthError::TokenExpired.is_authorization_failure());
        assert!(!AuthError::MissingCredentials.is_authorization_failure());
    }

    #[test]
    fn test_from_jwt_validation_error() {
        assert_eq!(
            AuthError::from(JwtValidationError::TokenTooLarge),
            AuthError::MalformedToken
        );
        assert_eq!(
            AuthError::from(JwtValidationError::MissingIssuer),
            AuthError::MalformedToken
        );
        assert_eq!(
            AuthError::from(JwtValidationError::Expired),
            AuthError::TokenExpired
        );
        assert_eq!(
            AuthError::from(JwtValidationError::NotYetValid),
            AuthError::TokenNotYetValid
        );
    }
}
