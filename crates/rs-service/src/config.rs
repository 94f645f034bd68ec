//! Resource server configuration.
//!
//! Configuration is loaded from environment variables and validated eagerly:
//! any invalid value fails startup. Nothing here is secret, so `Debug` is
//! derived.

use crate::auth::jwt::{algorithm_name, is_asymmetric, DEFAULT_ALLOWED_ALGORITHMS};
use crate::auth::jwks::MAX_CACHE_DURATION;
use crate::auth::{JwksCacheSettings, ValidationPolicy};
use common::jwt::{normalize_issuer, DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use jsonwebtoken::Algorithm;
use std::collections::{HashMap, HashSet};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default JWKS cache TTL in seconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Default JWKS fetch timeout in seconds.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 5;

/// Default stale-grace window in seconds (1 hour).
pub const DEFAULT_JWKS_STALE_GRACE_SECONDS: u64 = 3600;

/// Default minimum interval between key set refetches in seconds.
pub const DEFAULT_JWKS_MIN_REFRESH_INTERVAL_SECONDS: u64 = 30;

/// Default graceful shutdown drain period in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 30;

/// Upper bound for the cache TTL, stale grace and minimum refresh interval.
pub const MAX_CACHE_SECONDS: u64 = MAX_CACHE_DURATION.as_secs();

/// Upper bound for one JWKS or discovery fetch in seconds.
pub const MAX_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 60;

/// Upper bound for the graceful shutdown drain period in seconds.
pub const MAX_DRAIN_SECONDS: u64 = 300;

/// One entry of `TRUSTED_ISSUERS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedIssuerConfig {
    /// Issuer identifier, trailing slashes trimmed.
    pub issuer: String,

    /// Explicit JWKS URL; `None` means OIDC discovery.
    pub jwks_url: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Resource server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Issuers whose tokens are accepted. Never empty.
    pub trusted_issuers: Vec<TrustedIssuerConfig>,

    /// Audience every token must carry, if set.
    pub expected_audience: Option<String>,

    /// JWT clock skew tolerance in seconds (0..=600).
    pub jwt_clock_skew_seconds: u64,

    /// Asymmetric algorithms accepted in token headers.
    pub allowed_algorithms: Vec<Algorithm>,

    /// How long a fetched key set stays fresh.
    pub jwks_cache_ttl_seconds: u64,

    /// Timeout for each JWKS or discovery fetch.
    pub jwks_fetch_timeout_seconds: u64,

    /// How long past expiry a key set may be served when refresh fails.
    pub jwks_stale_grace_seconds: u64,

    /// Minimum age of a key set before an unknown kid or failed refresh may
    /// trigger another fetch.
    pub jwks_min_refresh_interval_seconds: u64,

    /// Log output format (default: text).
    pub log_format: LogFormat,

    /// Graceful shutdown drain period in seconds.
    pub drain_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid trusted issuer configuration: {0}")]
    InvalidTrustedIssuer(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid allowed algorithms configuration: {0}")]
    InvalidAlgorithm(String),

    #[error("Invalid duration configuration: {0}")]
    InvalidDuration(String),

    #[error("Invalid log format configuration: {0}")]
    InvalidLogFormat(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let trusted_issuers = parse_trusted_issuers(
            vars.get("TRUSTED_ISSUERS")
                .ok_or_else(|| ConfigError::MissingEnvVar("TRUSTED_ISSUERS".to_string()))?,
        )?;

        let expected_audience = vars
            .get("EXPECTED_AUDIENCE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        // Parse JWT clock skew tolerance with validation; zero is allowed
        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value < 0 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not be negative, got {}",
                    value
                )));
            }

            let value = value.unsigned_abs();
            if value > MAX_CLOCK_SKEW.as_secs() {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW.as_secs()
        };

        let allowed_algorithms = match vars.get("ALLOWED_ALGORITHMS") {
            Some(value) => parse_algorithms(value)?,
            None => DEFAULT_ALLOWED_ALGORITHMS.to_vec(),
        };

        let jwks_cache_ttl_seconds =
            parse_seconds(
            vars,
            "JWKS_CACHE_TTL_SECONDS",
            DEFAULT_JWKS_CACHE_TTL_SECONDS,
            1,
            MAX_CACHE_SECONDS,
        )?;
        let jwks_fetch_timeout_seconds = parse_seconds(
            vars,
            "JWKS_FETCH_TIMEOUT_SECONDS",
            DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS,
            1,
            MAX_JWKS_FETCH_TIMEOUT_SECONDS,
        )?;
        let jwks_stale_grace_seconds = parse_seconds(
            vars,
            "JWKS_STALE_GRACE_SECONDS",
            DEFAULT_JWKS_STALE_GRACE_SECONDS,
            0,
            MAX_CACHE_SECONDS,
        )?;
        let jwks_min_refresh_interval_seconds = parse_seconds(
            vars,
            "JWKS_MIN_REFRESH_INTERVAL_SECONDS",
            DEFAULT_JWKS_MIN_REFRESH_INTERVAL_SECONDS,
            0,
            MAX_CACHE_SECONDS,
        )?;

        let log_format = match vars.get("RS_LOG_FORMAT").map(|s| s.trim().to_ascii_lowercase()) {
            None => LogFormat::Text,
            Some(value) if value == "text" => LogFormat::Text,
            Some(value) if value == "json" => LogFormat::Json,
            Some(value) => {
                return Err(ConfigError::InvalidLogFormat(format!(
                    "RS_LOG_FORMAT must be 'text' or 'json', got '{}'",
                    value
                )))
            }
        };

        let drain_seconds = parse_seconds(
            vars,
            "RS_DRAIN_SECONDS",
            DEFAULT_DRAIN_SECONDS,
            0,
            MAX_DRAIN_SECONDS,
        )?;

        Ok(Config {
            bind_address,
            trusted_issuers,
            expected_audience,
            jwt_clock_skew_seconds,
            allowed_algorithms,
            jwks_cache_ttl_seconds,
            jwks_fetch_timeout_seconds,
            jwks_stale_grace_seconds,
            jwks_min_refresh_interval_seconds,
            log_format,
            drain_seconds,
        })
    }

    /// Key set cache tuning derived from this configuration.
    pub fn jwks_cache_settings(&self) -> JwksCacheSettings {
        JwksCacheSettings {
            ttl: Duration::from_secs(self.jwks_cache_ttl_seconds),
            fetch_timeout: Duration::from_secs(self.jwks_fetch_timeout_seconds),
            stale_grace: Duration::from_secs(self.jwks_stale_grace_seconds),
            min_refresh_interval: Duration::from_secs(self.jwks_min_refresh_interval_seconds),
        }
    }

    /// Token acceptance rules derived from this configuration.
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            allowed_algorithms: self.allowed_algorithms.clone(),
            clock_skew: Duration::from_secs(self.jwt_clock_skew_seconds),
            audience: self.expected_audience.clone(),
        }
    }
}

/// Parse `issuer` / `issuer|jwks_url` entries separated by commas.
fn parse_trusted_issuers(value: &str) -> Result<Vec<TrustedIssuerConfig>, ConfigError> {
    let mut seen = HashSet::new();
    let mut issuers = Vec::new();

    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (issuer, jwks_url) = match entry.split_once('|') {
            Some((issuer, url)) => (issuer.trim(), Some(url.trim())),
            None => (entry, None),
        };

        let issuer = normalize_issuer(issuer);
        if !is_http_url(issuer) {
            return Err(ConfigError::InvalidTrustedIssuer(format!(
                "issuer must be an http(s) URL, got '{}'",
                issuer
            )));
        }
        if let Some(url) = jwks_url {
            if !is_http_url(url) {
                return Err(ConfigError::InvalidTrustedIssuer(format!(
                    "JWKS URL for '{}' must be an http(s) URL, got '{}'",
                    issuer, url
                )));
            }
        }
        if !seen.insert(issuer.to_string()) {
            return Err(ConfigError::InvalidTrustedIssuer(format!(
                "issuer '{}' is listed more than once",
                issuer
            )));
        }

        issuers.push(TrustedIssuerConfig {
            issuer: issuer.to_string(),
            jwks_url: jwks_url.map(str::to_string),
        });
    }

    if issuers.is_empty() {
        return Err(ConfigError::InvalidTrustedIssuer(
            "TRUSTED_ISSUERS must list at least one issuer".to_string(),
        ));
    }

    Ok(issuers)
}

fn is_http_url(value: &str) -> bool {
    ["https://", "http://"]
        .iter()
        .any(|scheme| value.len() > scheme.len() && value.starts_with(scheme))
}

/// Parse a comma-separated list of asymmetric JOSE algorithm names.
fn parse_algorithms(value: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();

    for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let alg = Algorithm::from_str(name).map_err(|_| {
            ConfigError::InvalidAlgorithm(format!("unknown algorithm '{}'", name))
        })?;
        if !is_asymmetric(alg) {
            return Err(ConfigError::InvalidAlgorithm(format!(
                "symmetric algorithm '{}' is not allowed",
                algorithm_name(alg)
            )));
        }
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }

    if algorithms.is_empty() {
        return Err(ConfigError::InvalidAlgorithm(
            "ALLOWED_ALGORITHMS must list at least one algorithm".to_string(),
        ));
    }

    Ok(algorithms)
}

/// Parse a whole number of seconds within `min..=max`.
fn parse_seconds(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
    min: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: u64 = value_str.trim().parse().map_err(|e| {
        ConfigError::InvalidDuration(format!(
            "{} must be a valid non-negative integer, got '{}': {}",
            name, value_str, e
        ))
    })?;

    if value < min {
        return Err(ConfigError::InvalidDuration(format!(
            "{} must be at least {}, got {}",
            name, min, value
        )));
    }

    if value > max {
        return Err(ConfigError::InvalidDuration(format!(
            "{} must not exceed {}, got {}",
            name, max, value
        )));
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([(
            "TRUSTED_ISSUERS".to_string(),
            "https://issuer.example.com".to_string(),
        )])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(
            config.trusted_issuers,
            vec![TrustedIssuerConfig {
                issuer: "https://issuer.example.com".to_string(),
                jwks_url: None,
            }]
        );
        assert!(config.expected_audience.is_none());
        assert_eq!(config.jwt_clock_skew_seconds, DEFAULT_CLOCK_SKEW.as_secs());
        assert_eq!(
            config.allowed_algorithms,
            vec![Algorithm::RS256, Algorithm::ES256, Algorithm::EdDSA]
        );
        assert_eq!(config.jwks_cache_ttl_seconds, DEFAULT_JWKS_CACHE_TTL_SECONDS);
        assert_eq!(
            config.jwks_fetch_timeout_seconds,
            DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS
        );
        assert_eq!(
            config.jwks_stale_grace_seconds,
            DEFAULT_JWKS_STALE_GRACE_SECONDS
        );
        assert_eq!(
            config.jwks_min_refresh_interval_seconds,
            DEFAULT_JWKS_MIN_REFRESH_INTERVAL_SECONDS
        );
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.drain_seconds, DEFAULT_DRAIN_SECONDS);
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string()),
            (
                "TRUSTED_ISSUERS".to_string(),
                "https://a.example.com/ | https://a.example.com/keys, https://b.example.com"
                    .to_string(),
            ),
            ("EXPECTED_AUDIENCE".to_string(), "api://orders".to_string()),
            ("JWT_CLOCK_SKEW_SECONDS".to_string(), "0".to_string()),
            ("ALLOWED_ALGORITHMS".to_string(), "PS256, EdDSA".to_string()),
            ("JWKS_CACHE_TTL_SECONDS".to_string(), "60".to_string()),
            ("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "2".to_string()),
            ("JWKS_STALE_GRACE_SECONDS".to_string(), "0".to_string()),
            ("JWKS_MIN_REFRESH_INTERVAL_SECONDS".to_string(), "10".to_string()),
            ("RS_LOG_FORMAT".to_string(), "JSON".to_string()),
            ("RS_DRAIN_SECONDS".to_string(), "5".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(
            config.trusted_issuers,
            vec![
                TrustedIssuerConfig {
                    issuer: "https://a.example.com".to_string(),
                    jwks_url: Some("https://a.example.com/keys".to_string()),
                },
                TrustedIssuerConfig {
                    issuer: "https://b.example.com".to_string(),
                    jwks_url: None,
                },
            ]
        );
        assert_eq!(config.expected_audience.as_deref(), Some("api://orders"));
        assert_eq!(config.jwt_clock_skew_seconds, 0);
        assert_eq!(
            config.allowed_algorithms,
            vec![Algorithm::PS256, Algorithm::EdDSA]
        );
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.drain_seconds, 5);

        let settings = config.jwks_cache_settings();
        assert_eq!(settings.ttl, Duration::from_secs(60));
        assert_eq!(settings.fetch_timeout, Duration::from_secs(2));
        assert_eq!(settings.stale_grace, Duration::ZERO);
        assert_eq!(settings.min_refresh_interval, Duration::from_secs(10));

        let policy = config.validation_policy();
        assert_eq!(policy.clock_skew, Duration::ZERO);
        assert_eq!(policy.audience.as_deref(), Some("api://orders"));
    }

    #[test]
    fn test_from_vars_missing_trusted_issuers() {
        let result = Config::from_vars(&HashMap::new());
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "TRUSTED_ISSUERS"));
    }

    #[test]
    fn test_trusted_issuers_rejects_empty_list() {
        let mut vars = base_vars();
        vars.insert("TRUSTED_ISSUERS".to_string(), " , ".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidTrustedIssuer(msg)) if msg.contains("at least one"))
        );
    }

    #[test]
    fn test_trusted_issuers_rejects_non_url() {
        let mut vars = base_vars();
        vars.insert("TRUSTED_ISSUERS".to_string(), "issuer-a".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidTrustedIssuer(msg)) if msg.contains("http(s) URL"))
        );
    }

    #[test]
    fn test_trusted_issuers_rejects_bad_jwks_url() {
        let mut vars = base_vars();
        vars.insert(
            "TRUSTED_ISSUERS".to_string(),
            "https://a.example.com|ftp://a.example.com/keys".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidTrustedIssuer(msg)) if msg.contains("JWKS URL"))
        );
    }

    #[test]
    fn test_trusted_issuers_rejects_duplicates_after_trim() {
        let mut vars = base_vars();
        vars.insert(
            "TRUSTED_ISSUERS".to_string(),
            "https://a.example.com,https://a.example.com/".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidTrustedIssuer(msg)) if msg.contains("more than once"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_negative() {
        let mut vars = base_vars();
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "-100".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must not be negative"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_too_large() {
        let mut vars = base_vars();
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "601".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must not exceed 600"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_accepts_max() {
        let mut vars = base_vars();
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "600".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.jwt_clock_skew_seconds, 600);
    }

    #[test]
    fn test_jwt_clock_skew_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert(
            "JWT_CLOCK_SKEW_SECONDS".to_string(),
            "five-minutes".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must be a valid integer"))
        );
    }

    #[test]
    fn test_allowed_algorithms_rejects_hmac() {
        let mut vars = base_vars();
        vars.insert("ALLOWED_ALGORITHMS".to_string(), "RS256,HS256".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidAlgorithm(msg)) if msg.contains("symmetric"))
        );
    }

    #[test]
    fn test_allowed_algorithms_rejects_unknown_and_none() {
        for value in ["RS257", "none", ""] {
            let mut vars = base_vars();
            vars.insert("ALLOWED_ALGORITHMS".to_string(), value.to_string());

            let result = Config::from_vars(&vars);
            assert!(
                matches!(result, Err(ConfigError::InvalidAlgorithm(_))),
                "'{value}' should be rejected"
            );
        }
    }

    #[test]
    fn test_allowed_algorithms_deduplicates() {
        let mut vars = base_vars();
        vars.insert("ALLOWED_ALGORITHMS".to_string(), "ES256,ES256".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.allowed_algorithms, vec![Algorithm::ES256]);
    }

    #[test]
    fn test_cache_ttl_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("JWKS_CACHE_TTL_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidDuration(msg)) if msg.contains("JWKS_CACHE_TTL_SECONDS must be at least 1"))
        );
    }

    #[test]
    fn test_fetch_timeout_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "-1".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidDuration(msg)) if msg.contains("JWKS_FETCH_TIMEOUT_SECONDS"))
        );
    }

    #[test]
    fn test_cache_durations_reject_oversized_values() {
        for name in [
            "JWKS_CACHE_TTL_SECONDS",
            "JWKS_STALE_GRACE_SECONDS",
            "JWKS_MIN_REFRESH_INTERVAL_SECONDS",
        ] {
            let mut vars = base_vars();
            vars.insert(name.to_string(), u64::MAX.to_string());

            let result = Config::from_vars(&vars);
            assert!(
                matches!(&result, Err(ConfigError::InvalidDuration(msg)) if msg.contains(name) && msg.contains("must not exceed")),
                "{name}: {result:?}"
            );
        }
    }

    #[test]
    fn test_cache_durations_accept_upper_bound() {
        let mut vars = base_vars();
        vars.insert(
            "JWKS_CACHE_TTL_SECONDS".to_string(),
            MAX_CACHE_SECONDS.to_string(),
        );
        vars.insert(
            "JWKS_STALE_GRACE_SECONDS".to_string(),
            MAX_CACHE_SECONDS.to_string(),
        );

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.jwks_cache_settings().ttl, MAX_CACHE_DURATION);
    }

    #[test]
    fn test_fetch_timeout_and_drain_reject_oversized_values() {
        let mut vars = base_vars();
        vars.insert("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "61".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidDuration(msg)) if msg.contains("JWKS_FETCH_TIMEOUT_SECONDS")
        ));

        let mut vars = base_vars();
        vars.insert("RS_DRAIN_SECONDS".to_string(), "301".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidDuration(msg)) if msg.contains("RS_DRAIN_SECONDS")
        ));
    }

    #[test]
    fn test_log_format_rejects_unknown() {
        let mut vars = base_vars();
        vars.insert("RS_LOG_FORMAT".to_string(), "xml".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidLogFormat(_))));
    }

    #[test]
    fn test_empty_audience_is_unset() {
        let mut vars = base_vars();
        vars.insert("EXPECTED_AUDIENCE".to_string(), "  ".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert!(config.expected_audience.is_none());
    }
}
