//! Authorization configuration.
//!
//! Configuration is loaded from environment variables. The accepted signing
//! algorithm is fixed to RS256 and is not configurable.

use common::jwt::MAX_CLOCK_SKEW;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default JWKS cache TTL in seconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Default minimum age of a JWKS snapshot before an unknown `kid` may
/// trigger an out-of-band refresh.
pub const DEFAULT_JWKS_MIN_REFRESH_SECONDS: u64 = 30;

/// Default HTTP timeout for the JWKS fetch.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Default leeway applied to the `exp` claim (strict).
pub const DEFAULT_JWT_LEEWAY_SECONDS: u64 = 0;

/// Authorization configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Issuer domain, e.g. "tenant.us.auth0.com" (no scheme, no path).
    pub auth0_domain: String,

    /// Expected `aud` value for access tokens.
    pub api_audience: String,

    /// JWKS endpoint; derived from the domain unless overridden.
    pub jwks_url: String,

    /// How long a fetched key set is considered fresh.
    pub jwks_cache_ttl: Duration,

    /// Minimum snapshot age before an unknown `kid` may force a refresh.
    pub jwks_min_refresh_interval: Duration,

    /// HTTP timeout for fetching the key set.
    pub jwks_fetch_timeout: Duration,

    /// Leeway applied to the `exp` claim.
    pub jwt_leeway_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid issuer domain: {0}")]
    InvalidDomain(String),

    #[error("Invalid JWKS cache configuration: {0}")]
    InvalidJwksCache(String),

    #[error("Invalid JWT leeway configuration: {0}")]
    InvalidJwtLeeway(String),
}

impl AuthConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let auth0_domain = required(vars, "AUTH0_DOMAIN")?;
        if auth0_domain.contains("://") || auth0_domain.contains('/') {
            return Err(ConfigError::InvalidDomain(format!(
                "AUTH0_DOMAIN must be a bare host name without scheme or path, got '{}'",
                auth0_domain
            )));
        }

        let api_audience = required(vars, "API_AUDIENCE")?;

        let jwks_url = vars
            .get("JWKS_URL")
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| jwks_url_for_domain(&auth0_domain));

        let jwks_cache_ttl_seconds = parse_u64(
            vars,
            "JWKS_CACHE_TTL_SECONDS",
            DEFAULT_JWKS_CACHE_TTL_SECONDS,
            ConfigError::InvalidJwksCache,
        )?;
        if jwks_cache_ttl_seconds == 0 {
            return Err(ConfigError::InvalidJwksCache(
                "JWKS_CACHE_TTL_SECONDS must be greater than 0".to_string(),
            ));
        }

        let jwks_min_refresh_seconds = parse_u64(
            vars,
            "JWKS_MIN_REFRESH_SECONDS",
            DEFAULT_JWKS_MIN_REFRESH_SECONDS,
            ConfigError::InvalidJwksCache,
        )?;

        let jwks_fetch_timeout_seconds = parse_u64(
            vars,
            "JWKS_FETCH_TIMEOUT_SECONDS",
            DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS,
            ConfigError::InvalidJwksCache,
        )?;
        if jwks_fetch_timeout_seconds == 0 {
            return Err(ConfigError::InvalidJwksCache(
                "JWKS_FETCH_TIMEOUT_SECONDS must be greater than 0".to_string(),
            ));
        }

        let jwt_leeway_seconds = parse_u64(
            vars,
            "JWT_LEEWAY_SECONDS",
            DEFAULT_JWT_LEEWAY_SECONDS,
            ConfigError::InvalidJwtLeeway,
        )?;
        if jwt_leeway_seconds > MAX_CLOCK_SKEW.as_secs() {
            return Err(ConfigError::InvalidJwtLeeway(format!(
                "JWT_LEEWAY_SECONDS must not exceed {} seconds, got {}",
                MAX_CLOCK_SKEW.as_secs(),
                jwt_leeway_seconds
            )));
        }

        Ok(AuthConfig {
            auth0_domain,
            api_audience,
            jwks_url,
            jwks_cache_ttl: Duration::from_secs(jwks_cache_ttl_seconds),
            jwks_min_refresh_interval: Duration::from_secs(jwks_min_refresh_seconds),
            jwks_fetch_timeout: Duration::from_secs(jwks_fetch_timeout_seconds),
            jwt_leeway_seconds,
        })
    }

    /// Expected `iss` claim: `https://{domain}/`, trailing slash included.
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.auth0_domain)
    }
}

/// Published JWKS location for an issuer domain.
pub fn jwks_url_for_domain(domain: &str) -> String {
    format!("https://{}/.well-known/jwks.json", domain)
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn parse_u64(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
    err: fn(String) -> ConfigError,
) -> Result<u64, ConfigError> {
    match vars.get(name) {
        Some(value_str) => value_str.parse().map_err(|e| {
            err(format!(
                "{} must be a valid non-negative integer, got '{}': {}",
                name, value_str, e
            ))
        }),
        None => Ok(default),
    }
}
