//! JWKS cache for fetching and caching the issuer's public signing keys.
//!
//! Fetches `https://{domain}/.well-known/jwks.json` and keeps the result as an
//! immutable snapshot for a configurable TTL.
//!
//! # Concurrency
//!
//! - The cached key set is an `Arc<JwkSet>` swapped wholesale under a write
//!   lock; readers clone the `Arc` and never observe a partial update
//! - At most one fetch is in flight per cache. Callers that find the cache
//!   stale queue on the refresh mutex and, once they get it, take the outcome
//!   of any attempt that completed after they arrived: the fresh snapshot on
//!   success, the same `NetworkFailure` on error
//! - A failed refresh leaves the previous snapshot in place but does not
//!   serve it: the caller gets `NetworkFailure`

use crate::config::{AuthConfig, DEFAULT_JWKS_CACHE_TTL_SECONDS, DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS};
use crate::errors::AuthError;
use crate::observability::metrics;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Jwk {
    /// Key type (expected "RSA").
    pub kty: String,

    /// Key ID - matched against the token header's `kid`.
    #[serde(default)]
    pub kid: Option<String>,

    /// Key use (expected "sig").
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    /// Algorithm the key is intended for (should be "RS256" when present).
    #[serde(default)]
    pub alg: Option<String>,
}

/// Published key set, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JwkSet {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Find the first key whose `kid` equals `kid`.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set publishes no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Cached key set with the time it was fetched.
struct CachedJwks {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Bookkeeping owned by whoever holds the refresh mutex.
#[derive(Default)]
struct RefreshState {
    last_attempt: Option<Instant>,

    /// Attempt number and error of the latest attempt, if it failed.
    last_failure: Option<(u64, AuthError)>,
}

impl RefreshState {
    /// The error of a failed attempt that completed after attempt `seen`.
    fn failure_since(&self, seen: u64) -> Option<AuthError> {
        self.last_failure
            .as_ref()
            .filter(|(attempt, _)| *attempt > seen)
            .map(|(_, err)| err.clone())
    }
}

/// Thread-safe cache of the issuer's JWKS.
pub struct JwksCache {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,

    /// Current snapshot, if any fetch has succeeded.
    cache: RwLock<Option<CachedJwks>>,

    /// Serializes refreshes so only one fetch is in flight.
    refresh: Mutex<RefreshState>,

    /// Completed fetch attempts. Read before queueing on `refresh`.
    attempts: AtomicU64,

    /// Cache TTL duration.
    cache_ttl: Duration,
}

impl JwksCache {
    /// Create a JWKS cache with the default TTL.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL to the issuer's JWKS endpoint
    pub fn new(jwks_url: String) -> Self {
        Self::with_ttl(jwks_url, Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECONDS))
    }

    /// Create a JWKS cache with a custom TTL.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL to the issuer's JWKS endpoint
    /// * `cache_ttl` - How long a fetched key set is served before refreshing
    pub fn with_ttl(jwks_url: String, cache_ttl: Duration) -> Self {
        Self::build(
            jwks_url,
            cache_ttl,
            Duration::from_secs(DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS),
        )
    }

    /// Create a JWKS cache from configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::build(
            config.jwks_url.clone(),
            config.jwks_cache_ttl,
            config.jwks_fetch_timeout,
        )
    }

    fn build(jwks_url: String, cache_ttl: Duration, fetch_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: RwLock::new(None),
            refresh: Mutex::new(RefreshState::default()),
            attempts: AtomicU64::new(0),
            cache_ttl,
        }
    }

    /// Get the current key set, fetching it if the cache is empty or expired.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NetworkFailure` if the key set has to be fetched
    /// and the fetch fails (transport error, non-2xx status, malformed JSON,
    /// or a document without a `keys` array).
    #[instrument(skip(self))]
    pub async fn get_key_set(&self) -> Result<Arc<JwkSet>, AuthError> {
        if let Some(keys) = self.fresh_snapshot().await {
            tracing::debug!(target: "auth.jwks", "JWKS cache hit");
            return Ok(keys);
        }

        let seen = self.attempts.load(Ordering::Acquire);
        let mut state = self.refresh.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(keys) = self.fresh_snapshot().await {
            tracing::debug!(target: "auth.jwks", "JWKS refreshed by concurrent caller");
            return Ok(keys);
        }

        if let Some(err) = state.failure_since(seen) {
            tracing::debug!(target: "auth.jwks", "JWKS refresh by concurrent caller failed");
            return Err(err);
        }

        self.fetch_and_swap(&mut state).await
    }

    /// Refresh after a token referenced a `kid` missing from the snapshot.
    ///
    /// Fetches only if no refresh was attempted within `min_interval`;
    /// otherwise returns the current snapshot as long as it is fresh.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NetworkFailure` if a fetch is made and fails, or
    /// if a fetch that completed while this call waited failed.
    #[instrument(skip(self))]
    pub async fn refresh_for_unknown_kid(
        &self,
        min_interval: Duration,
    ) -> Result<Arc<JwkSet>, AuthError> {
        let seen = self.attempts.load(Ordering::Acquire);
        let mut state = self.refresh.lock().await;

        if let Some(err) = state.failure_since(seen) {
            tracing::debug!(target: "auth.jwks", "JWKS refresh by concurrent caller failed");
            return Err(err);
        }

        let recently_attempted = state
            .last_attempt
            .is_some_and(|attempt| attempt.elapsed() < min_interval);

        if recently_attempted {
            if let Some(keys) = self.fresh_snapshot().await {
                tracing::debug!(target: "auth.jwks", "Unknown kid refresh suppressed, snapshot is recent");
                return Ok(keys);
            }
        }

        self.fetch_and_swap(&mut state).await
    }

    /// Force a refresh regardless of TTL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NetworkFailure` if the fetch fails.
    pub async fn force_refresh(&self) -> Result<Arc<JwkSet>, AuthError> {
        let mut state = self.refresh.lock().await;
        self.fetch_and_swap(&mut state).await
    }

    /// Number of keys in the current snapshot (0 if nothing was fetched yet).
    pub async fn cached_key_count(&self) -> usize {
        self.cache
            .read()
            .await
            .as_ref()
            .map_or(0, |cached| cached.keys.len())
    }

    async fn fresh_snapshot(&self) -> Option<Arc<JwkSet>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.cache_ttl)
            .map(|cached| Arc::clone(&cached.keys))
    }

    /// Fetch and publish a new snapshot. Callers must hold the refresh mutex.
    async fn fetch_and_swap(&self, state: &mut RefreshState) -> Result<Arc<JwkSet>, AuthError> {
        let started = Instant::now();
        state.last_attempt = Some(started);

        let result = self.fetch().await;
        let attempt = self.attempts.fetch_add(1, Ordering::AcqRel) + 1;

        match result {
            Ok(jwks) => {
                state.last_failure = None;
                let keys = Arc::new(jwks);

                tracing::info!(
                    target: "auth.jwks",
                    key_count = keys.len(),
                    "JWKS cache refreshed"
                );

                let mut cache = self.cache.write().await;
                *cache = Some(CachedJwks {
                    keys: Arc::clone(&keys),
                    fetched_at: Instant::now(),
                });

                metrics::record_jwks_refresh("success", started.elapsed());
                Ok(keys)
            }
            Err(e) => {
                state.last_failure = Some((attempt, e.clone()));
                metrics::record_jwks_refresh("error", started.elapsed());
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        tracing::debug!(target: "auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "auth.jwks", error = %e, "Failed to fetch JWKS");
                AuthError::NetworkFailure(format!("Failed to fetch JWKS: {}", e))
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(AuthError::NetworkFailure(format!(
                "JWKS endpoint returned HTTP {}",
                response.status()
            )));
        }

        response.json::<JwkSet>().await.map_err(|e| {
            tracing::error!(target: "auth.jwks", error = %e, "Failed to parse JWKS response");
            AuthError::NetworkFailure(format!("Failed to parse JWKS: {}", e))
        })
    }
}
