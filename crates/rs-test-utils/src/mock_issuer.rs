//! Mock token issuers backed by wiremock.
//!
//! Each `MockIssuer` is its own HTTP server; its issuer identifier is the
//! server's base URL so discovery documents line up with it.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the JWKS document is served on.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Path the OIDC discovery document is served on.
pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// A wiremock server playing one issuer.
pub struct MockIssuer {
    server: MockServer,
}

impl MockIssuer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Issuer identifier (`iss`) of this mock.
    pub fn issuer(&self) -> String {
        self.server.uri()
    }

    /// Explicit JWKS URL of this mock.
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// `TRUSTED_ISSUERS` entry with an explicit JWKS URL.
    pub fn trusted_issuer_entry(&self) -> String {
        format!("{}|{}", self.issuer(), self.jwks_url())
    }

    /// Serve `keys` as the JWKS document.
    pub async fn mount_jwks(&self, keys: Vec<Value>) {
        self.mount_jwks_response(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })), None)
            .await;
    }

    /// Serve `keys` with a response delay, expecting exactly `expected_calls`
    /// fetches when the mock is verified or dropped.
    pub async fn mount_slow_jwks(&self, keys: Vec<Value>, delay: Duration, expected_calls: u64) {
        self.mount_jwks_response(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "keys": keys }))
                .set_delay(delay),
            Some(expected_calls),
        )
        .await;
    }

    /// Serve an arbitrary JWKS response, optionally with a call count expectation.
    pub async fn mount_jwks_response(&self, response: ResponseTemplate, expected_calls: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(response);
        let mock = match expected_calls {
            Some(n) => mock.expect(n),
            None => mock,
        };
        mock.mount(&self.server).await;
    }

    /// Serve `keys` for the first `times` fetches only.
    pub async fn mount_jwks_times(&self, keys: Vec<Value>, times: u64) {
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    /// Serve an OIDC discovery document pointing at this mock's JWKS path.
    pub async fn mount_discovery(&self) {
        self.mount_discovery_for(&self.issuer()).await;
    }

    /// Serve a discovery document that claims to be `issuer`.
    pub async fn mount_discovery_for(&self, issuer: &str) {
        Mock::given(method("GET"))
            .and(path(DISCOVERY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": issuer,
                "jwks_uri": self.jwks_url(),
                "response_types_supported": ["code"],
                "id_token_signing_alg_values_supported": ["RS256", "ES256", "EdDSA"]
            })))
            .mount(&self.server)
            .await;
    }

    /// Number of JWKS fetches received so far.
    pub async fn jwks_fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| {
                requests
                    .iter()
                    .filter(|r| r.url.path() == JWKS_PATH)
                    .count()
            })
            .unwrap_or_default()
    }

    /// Verify call count expectations now instead of on drop.
    pub async fn verify(&self) {
        self.server.verify().await;
    }
}
