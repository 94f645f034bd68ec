//! JWKS client for fetching and caching one issuer's public keys.
//!
//! Each trusted issuer owns one `JwksClient`. Keys are cached with a TTL and
//! refreshed lazily on miss or expiry.
//!
//! # Concurrency
//!
//! - Readers take a shared lock and clone an `Arc` snapshot of the key map;
//!   a refresh swaps in a whole new map, so a partially written set is never
//!   observable.
//! - Refreshes serialize on a per-issuer mutex. A caller records the instant
//!   it started looking before queueing; if the last attempt finished after
//!   that instant, it reuses that attempt's outcome instead of fetching again.
//!   At most one fetch per issuer is in flight.
//!
//! # Failure handling
//!
//! - A failed fetch falls back to the previous key set while it is within the
//!   stale-grace window, and refetches are held off for the minimum refresh
//!   interval.
//! - An unknown `kid` against a fresh set only triggers a refetch once the set
//!   is older than the minimum refresh interval and no failed refresh is
//!   being backed off.

use crate::auth::discovery;
use crate::auth::AuthError;
use crate::observability::metrics;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Key types the verifier can build decoding keys for.
const SUPPORTED_KEY_TYPES: &[&str] = &["RSA", "EC", "OKP"];

/// JSON Web Key from an issuer's JWKS endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Jwk {
    /// Key type: "RSA", "EC" or "OKP".
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Algorithm the key is intended for, when the issuer pins one.
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (must be "sig" when present).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// Curve name (EC and OKP keys).
    #[serde(default)]
    pub crv: Option<String>,

    /// Public key x coordinate / OKP public key (base64url).
    #[serde(default)]
    pub x: Option<String>,

    /// EC public key y coordinate (base64url).
    #[serde(default)]
    pub y: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,
}

/// JWKS document. Entries are kept as raw JSON and filtered individually.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    pub keys: Vec<Value>,
}

impl JwksResponse {
    /// Build the `kid` -> key map, skipping entries that cannot be used for
    /// signature verification.
    pub fn into_key_map(self) -> HashMap<String, Jwk> {
        let mut keys = HashMap::with_capacity(self.keys.len());
        for entry in self.keys {
            let jwk: Jwk = match serde_json::from_value(entry) {
                Ok(jwk) => jwk,
                Err(e) => {
                    tracing::debug!(target: "rs.auth.jwks", error = %e, "Skipping unparseable JWK");
                    continue;
                }
            };
            if jwk.kid.is_empty() {
                tracing::debug!(target: "rs.auth.jwks", "Skipping JWK without kid");
                continue;
            }
            if jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
                tracing::debug!(target: "rs.auth.jwks", kid = %jwk.kid, "Skipping non-signing JWK");
                continue;
            }
            if !SUPPORTED_KEY_TYPES.contains(&jwk.kty.as_str()) {
                tracing::debug!(target: "rs.auth.jwks", kid = %jwk.kid, kty = %jwk.kty, "Skipping unsupported JWK type");
                continue;
            }
            keys.insert(jwk.kid.clone(), jwk);
        }
        keys
    }
}

/// Where an issuer's key set is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwksSource {
    /// Explicitly configured JWKS URL.
    Url(String),
    /// Resolve `jwks_uri` from the issuer's OIDC discovery document.
    Discovery,
}

/// Upper bound applied to every cache duration (30 days).
pub const MAX_CACHE_DURATION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Cache tuning shared by every issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JwksCacheSettings {
    /// How long a fetched key set is considered fresh.
    pub ttl: Duration,
    /// Upper bound for one outbound fetch.
    pub fetch_timeout: Duration,
    /// How long past expiry a key set may still be served when refresh fails.
    pub stale_grace: Duration,
    /// Minimum age of a key set before an unknown `kid` or a failed refresh
    /// may trigger another fetch.
    pub min_refresh_interval: Duration,
}

impl JwksCacheSettings {
    /// Copy with every cache duration capped at [`MAX_CACHE_DURATION`], so
    /// deadline arithmetic on `Instant` cannot overflow.
    pub fn bounded(self) -> Self {
        Self {
            ttl: self.ttl.min(MAX_CACHE_DURATION),
            fetch_timeout: self.fetch_timeout.min(MAX_CACHE_DURATION),
            stale_grace: self.stale_grace.min(MAX_CACHE_DURATION),
            min_refresh_interval: self.min_refresh_interval.min(MAX_CACHE_DURATION),
        }
    }
}

impl Default for JwksCacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            fetch_timeout: Duration::from_secs(5),
            stale_grace: Duration::from_secs(3600),
            min_refresh_interval: Duration::from_secs(30),
        }
    }
}

/// Cached JWKS snapshot.
struct CachedJwks {
    keys: Arc<HashMap<String, Jwk>>,
    fetched_at: Instant,
    expires_at: Instant,
    /// No fetch before this instant; pushed forward when a refresh fails.
    retry_at: Instant,
}

impl CachedJwks {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    fn within_grace(&self, now: Instant, stale_grace: Duration) -> bool {
        now < self.expires_at + stale_grace
    }
}

/// State guarded by the refresh mutex.
struct RefreshState {
    /// When the most recent fetch attempt completed.
    last_attempt: Option<Instant>,
    /// JWKS URL, configured or resolved through discovery.
    jwks_url: Option<String>,
}

/// JWKS client for one trusted issuer.
pub struct JwksClient {
    issuer: String,
    http_client: reqwest::Client,
    settings: JwksCacheSettings,
    cache: RwLock<Option<CachedJwks>>,
    refresh: Mutex<RefreshState>,
}

impl JwksClient {
    /// Create a client for `issuer`. No I/O happens until the first lookup.
    pub fn new(
        issuer: String,
        source: JwksSource,
        http_client: reqwest::Client,
        settings: JwksCacheSettings,
    ) -> Self {
        let jwks_url = match source {
            JwksSource::Url(url) => Some(url),
            JwksSource::Discovery => None,
        };

        Self {
            issuer,
            http_client,
            settings: settings.bounded(),
            cache: RwLock::new(None),
            refresh: Mutex::new(RefreshState {
                last_attempt: None,
                jwks_url,
            }),
        }
    }

    /// Get a signing key by key ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownKey` if the key set has no such key, and
    /// `AuthError::KeyFetchError` if no usable key set could be obtained.
    #[instrument(skip(self), fields(issuer = %self.issuer))]
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        let requested_at = Instant::now();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let now = Instant::now();
                if cached.is_fresh(now) {
                    if let Some(key) = cached.keys.get(kid) {
                        tracing::debug!(target: "rs.auth.jwks", kid = %kid, "JWKS cache hit");
                        return Ok(key.clone());
                    }
                    if now < cached.retry_at
                        || now.duration_since(cached.fetched_at) < self.settings.min_refresh_interval
                    {
                        tracing::debug!(target: "rs.auth.jwks", kid = %kid, "Key not found in fresh JWKS cache");
                        return Err(AuthError::UnknownKey);
                    }
                } else if now < cached.retry_at {
                    // Last refresh failed recently; the issuer is not contacted again yet
                    if !cached.within_grace(now, self.settings.stale_grace) {
                        tracing::debug!(target: "rs.auth.jwks", "JWKS refresh backing off, no usable key set");
                        return Err(AuthError::KeyFetchError);
                    }
                    metrics::record_stale_jwks_served();
                    return cached.keys.get(kid).cloned().ok_or(AuthError::UnknownKey);
                }
            }
        }

        let keys = self.refresh_keys(requested_at).await?;

        keys.get(kid).cloned().ok_or_else(|| {
            tracing::debug!(target: "rs.auth.jwks", kid = %kid, "Key not found in JWKS after refresh");
            AuthError::UnknownKey
        })
    }

    /// Fetch the key set, or reuse the outcome of an attempt that completed
    /// after `requested_at`.
    async fn refresh_keys(
        &self,
        requested_at: Instant,
    ) -> Result<Arc<HashMap<String, Jwk>>, AuthError> {
        let mut state = self.refresh.lock().await;

        if state.last_attempt.is_some_and(|last| last >= requested_at) {
            tracing::debug!(target: "rs.auth.jwks", "Reusing concurrent JWKS refresh outcome");
            return self.usable_keys().await;
        }

        let started = Instant::now();
        let result = self.fetch_key_set(&mut state).await;
        state.last_attempt = Some(Instant::now());

        match result {
            Ok(keys) => {
                metrics::record_jwks_refresh("success", started.elapsed());
                tracing::info!(
                    target: "rs.auth.jwks",
                    issuer = %self.issuer,
                    key_count = keys.len(),
                    "JWKS cache refreshed"
                );

                let keys = Arc::new(keys);
                let now = Instant::now();
                let mut cache = self.cache.write().await;
                *cache = Some(CachedJwks {
                    keys: Arc::clone(&keys),
                    fetched_at: now,
                    expires_at: now + self.settings.ttl,
                    retry_at: now,
                });
                Ok(keys)
            }
            Err(e) => {
                metrics::record_jwks_refresh("error", started.elapsed());

                let mut cache = self.cache.write().await;
                if let Some(cached) = cache.as_mut() {
                    cached.retry_at = Instant::now() + self.settings.min_refresh_interval;
                }
                drop(cache);

                self.usable_keys().await.map_err(|_| e)
            }
        }
    }

    /// Current key set if it is fresh or still within the stale-grace window.
    async fn usable_keys(&self) -> Result<Arc<HashMap<String, Jwk>>, AuthError> {
        let cache = self.cache.read().await;
        let now = Instant::now();
        match cache.as_ref() {
            Some(cached) if cached.is_fresh(now) => Ok(Arc::clone(&cached.keys)),
            Some(cached) if cached.within_grace(now, self.settings.stale_grace) => {
                tracing::warn!(
                    target: "rs.auth.jwks",
                    issuer = %self.issuer,
                    "JWKS refresh failed, serving stale key set"
                );
                metrics::record_stale_jwks_served();
                Ok(Arc::clone(&cached.keys))
            }
            _ => Err(AuthError::KeyFetchError),
        }
    }

    async fn fetch_key_set(
        &self,
        state: &mut RefreshState,
    ) -> Result<HashMap<String, Jwk>, AuthError> {
        let jwks_url = match &state.jwks_url {
            Some(url) => url.clone(),
            None => {
                let url = discovery::discover_jwks_uri(
                    &self.http_client,
                    &self.issuer,
                    self.settings.fetch_timeout,
                )
                .await?;
                state.jwks_url = Some(url.clone());
                url
            }
        };

        tracing::debug!(target: "rs.auth.jwks", url = %jwks_url, "Fetching JWKS");

        let jwks: JwksResponse =
            fetch_json(&self.http_client, &jwks_url, self.settings.fetch_timeout).await?;
        Ok(jwks.into_key_map())
    }
}

/// GET `url` and parse the body as JSON, bounded by `timeout`.
///
/// Every failure maps to `AuthError::KeyFetchError`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http_client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<T, AuthError> {
    let response = http_client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            tracing::error!(target: "rs.auth.jwks", url = %url, error = %e, "Key material fetch failed");
            AuthError::KeyFetchError
        })?;

    if !response.status().is_success() {
        tracing::error!(
            target: "rs.auth.jwks",
            url = %url,
            status = %response.status(),
            "Key material endpoint returned error"
        );
        return Err(AuthError::KeyFetchError);
    }

    response.json().await.map_err(|e| {
        tracing::error!(target: "rs.auth.jwks", url = %url, error = %e, "Failed to parse key material response");
        AuthError::KeyFetchError
    })
}
