//! Scope-protected sample endpoints.
//!
//! Both routes share one handler; which scope they need is decided by the
//! `ScopeRequirement` bound to each route.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ScopeResponse {
    #[serde(rename = "hasScope")]
    pub has_scope: &'static str,
}

/// Handler for /api/sample/protected/* (any method)
///
/// Only reached once the route's scope guard has passed.
///
/// ```json
/// { "hasScope": "true" }
/// ```
pub async fn scope_protected() -> Json<ScopeResponse> {
    Json(ScopeResponse { has_scope: "true" })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_response_serialization() {
        let json = serde_json::to_value(ScopeResponse { has_scope: "true" }).unwrap();
        assert_eq!(json, serde_json::json!({"hasScope": "true"}));
    }
}
