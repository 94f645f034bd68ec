//! Test server harness for E2E testing
//!
//! Provides `TestResourceServer` for spawning real resource server instances
//! in tests, trusting one or more mock issuers.

use crate::mock_issuer::MockIssuer;
use metrics_exporter_prometheus::PrometheusHandle;
use rs_service::auth::{IssuerRegistry, ResourceAuthenticator};
use rs_service::config::Config;
use rs_service::observability::metrics::init_metrics_recorder;
use rs_service::routes;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

/// Test harness for spawning the resource server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_flow_e2e() -> Result<(), anyhow::Error> {
///     let issuer = MockIssuer::start().await;
///     let server = TestResourceServer::spawn(&[&issuer]).await?;
///
///     let response = reqwest::get(format!("{}/actuator/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestResourceServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestResourceServer {
    /// Spawn a server trusting `issuers` through their explicit JWKS URLs.
    pub async fn spawn(issuers: &[&MockIssuer]) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(base_vars(issuers)).await
    }

    /// Spawn a server from raw configuration variables.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with_vars(vars: HashMap<String, String>) -> Result<Self, anyhow::Error> {
        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let registry = IssuerRegistry::new(&config.trusted_issuers, config.jwks_cache_settings());
        let authenticator = Arc::new(ResourceAuthenticator::new(
            registry,
            config.validation_policy(),
        ));

        // Build routes using the service's real route builder
        let app = routes::build_routes(authenticator, test_metrics_handle());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestResourceServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

/// Configuration variables trusting `issuers` via explicit JWKS URLs.
pub fn base_vars(issuers: &[&MockIssuer]) -> HashMap<String, String> {
    let trusted = issuers
        .iter()
        .map(|issuer| issuer.trusted_issuer_entry())
        .collect::<Vec<_>>()
        .join(",");

    HashMap::from([
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ("TRUSTED_ISSUERS".to_string(), trusted),
        ("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "2".to_string()),
        ("RS_DRAIN_SECONDS".to_string(), "0".to_string()),
    ])
}
