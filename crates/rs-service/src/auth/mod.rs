//! Bearer token authentication and scope authorization.
//!
//! - [`issuer`]: trusted issuer registry, one key set per issuer
//! - [`jwks`]: per-issuer key set cache with deduplicated refresh
//! - [`discovery`]: OIDC discovery of JWKS URLs
//! - [`jwt`]: signature verification primitives
//! - [`authenticator`]: the request authentication pipeline
//! - [`scope`]: scope requirements and the authorization predicate

pub mod authenticator;
pub mod claims;
pub mod discovery;
pub mod error;
pub mod issuer;
pub mod jwks;
pub mod jwt;
pub mod scope;

pub use authenticator::{extract_bearer_token, ResourceAuthenticator, ValidationPolicy};
pub use claims::{Claims, Principal};
pub use error::AuthError;
pub use issuer::{IssuerRegistry, TrustedIssuer};
pub use jwks::{Jwk, JwksCacheSettings, JwksSource};
pub use scope::{authorize, ScopeRequirement};
