//! # RS Test Utilities
//!
//! Shared test utilities for the resource server.
//!
//! This crate provides:
//! - Deterministic key fixtures (Ed25519 seeds, fixed RSA and P-256 keys)
//! - Token builders for signed and deliberately broken tokens
//! - Mock issuers serving JWKS and OIDC discovery documents
//! - Server test harness (`TestResourceServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rs_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let keypair = TestKeypair::from_seed(1, "key-1");
//!     let issuer = MockIssuer::start().await;
//!     issuer.mount_jwks(vec![keypair.jwk()]).await;
//!
//!     let server = TestResourceServer::spawn(&[&issuer]).await?;
//!     let token = TestTokenBuilder::new(&issuer.issuer())
//!         .with_scope("openid")
//!         .sign_ed25519(&keypair);
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/api/jwt/info", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod mock_issuer;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use mock_issuer::*;
pub use server_harness::*;
pub use token_builders::*;
