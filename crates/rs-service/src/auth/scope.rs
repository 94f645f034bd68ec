//! Scope requirements and the authorization predicate.

use crate::auth::{AuthError, Claims};

/// Scopes a route requires, bound when the route is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeRequirement {
    /// Every listed scope must be granted. An empty list always passes.
    AllOf(Vec<String>),
    /// At least one listed scope must be granted. An empty list never passes.
    AnyOf(Vec<String>),
}

impl ScopeRequirement {
    /// Require a single scope.
    pub fn scope(scope: impl Into<String>) -> Self {
        Self::AllOf(vec![scope.into()])
    }

    pub fn all_of<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AllOf(scopes.into_iter().map(Into::into).collect())
    }

    pub fn any_of<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyOf(scopes.into_iter().map(Into::into).collect())
    }

    fn is_satisfied_by(&self, claims: &Claims) -> bool {
        match self {
            Self::AllOf(scopes) => scopes.iter().all(|s| claims.has_scope(s)),
            Self::AnyOf(scopes) => scopes.iter().any(|s| claims.has_scope(s)),
        }
    }
}

/// Decide whether `claims` satisfy `requirement`.
///
/// # Errors
///
/// Returns `AuthError::InsufficientScope` if they do not.
pub fn authorize(claims: &Claims, requirement: &ScopeRequirement) -> Result<(), AuthError> {
    if requirement.is_satisfied_by(claims) {
        Ok(())
    } else {
        tracing::debug!(
            target: "rs.auth.scope",
            required = ?requirement,
            granted = ?claims.scopes,
            "Insufficient scope"
        );
        Err(AuthError::InsufficientScope)
    }
}
