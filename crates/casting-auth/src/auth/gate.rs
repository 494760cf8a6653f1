//! The authorization pipeline run before every protected operation.
//!
//! Steps run strictly in order and stop at the first failure, whose
//! `AuthError` is returned unchanged:
//!
//! ```text
//! ExtractToken -> FetchKeys -> VerifySignature -> ValidateClaims -> CheckPermission
//! ```

use crate::auth::claims::{ClaimSet, ClaimsValidator};
use crate::auth::extractor::{extract_bearer_token, BearerToken};
use crate::auth::jwks::{JwkSet, JwksCache};
use crate::auth::jwt::{verify_signature, UnvalidatedClaims};
use crate::auth::permissions::check_permission;
use crate::config::{AuthConfig, DEFAULT_JWKS_MIN_REFRESH_SECONDS};
use crate::errors::AuthError;
use crate::observability::metrics;
use common::jwt::extract_kid;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Composes extraction, key lookup, verification, claims validation and the
/// permission check into one call.
///
/// Cheap to share: clone the `Arc` it lives in, not the gate.
pub struct AuthorizationGate {
    jwks: Arc<JwksCache>,
    validator: ClaimsValidator,
    min_refresh_interval: Duration,
}

impl AuthorizationGate {
    /// Create a gate over an existing cache.
    pub fn new(jwks: Arc<JwksCache>, validator: ClaimsValidator) -> Self {
        Self {
            jwks,
            validator,
            min_refresh_interval: Duration::from_secs(DEFAULT_JWKS_MIN_REFRESH_SECONDS),
        }
    }

    /// Minimum time between refreshes triggered by an unknown `kid`.
    #[must_use]
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Build the cache, validator and refresh interval from configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            Arc::new(JwksCache::from_config(config)),
            ClaimsValidator::from_config(config),
        )
        .with_min_refresh_interval(config.jwks_min_refresh_interval)
    }

    /// The key set cache this gate verifies against.
    pub fn jwks(&self) -> &Arc<JwksCache> {
        &self.jwks
    }

    /// Authorize a request.
    ///
    /// # Arguments
    ///
    /// * `required_permission` - permission the operation needs; empty
    ///   demands none beyond a present `permissions` claim
    /// * `auth_header` - raw `Authorization` header value, if any
    ///
    /// # Errors
    ///
    /// The `AuthError` of the first failing step, unchanged.
    #[instrument(skip_all, name = "auth.gate.authorize", fields(permission = %required_permission))]
    pub async fn authorize(
        &self,
        required_permission: &str,
        auth_header: Option<&str>,
    ) -> Result<ClaimSet, AuthError> {
        let started = Instant::now();
        let result = self.run_pipeline(required_permission, auth_header).await;

        let outcome = metrics::outcome_label(&result);
        metrics::record_authorization(outcome, started.elapsed());

        match &result {
            Ok(_) => tracing::debug!(target: "auth.gate", "Request authorized"),
            Err(e) => tracing::debug!(
                target: "auth.gate",
                outcome = outcome,
                status = e.status_code(),
                "Request rejected"
            ),
        }

        result
    }

    async fn run_pipeline(
        &self,
        required_permission: &str,
        auth_header: Option<&str>,
    ) -> Result<ClaimSet, AuthError> {
        let token = extract_bearer_token(auth_header)?;
        let keys = self.jwks.get_key_set().await?;
        let payload = self.verify(&token, &keys).await?;
        let claims = self.validator.validate(&payload)?;
        check_permission(required_permission, &claims)?;
        Ok(claims)
    }

    /// Verify, refreshing the key set once if the token's `kid` is unknown.
    async fn verify(
        &self,
        token: &BearerToken,
        keys: &JwkSet,
    ) -> Result<UnvalidatedClaims, AuthError> {
        match verify_signature(token, keys) {
            Err(AuthError::KeyNotFound(_)) if kid_is_unknown(token, keys) => {
                tracing::debug!(target: "auth.gate", "Token kid not in key set, refreshing");
                let refreshed = self
                    .jwks
                    .refresh_for_unknown_kid(self.min_refresh_interval)
                    .await?;
                verify_signature(token, &refreshed)
            }
            other => other,
        }
    }
}

/// True when the token names a `kid` the set does not contain, as opposed
/// to naming a key that exists but cannot verify RS256.
fn kid_is_unknown(token: &BearerToken, keys: &JwkSet) -> bool {
    extract_kid(token.as_str()).is_ok_and(|kid| keys.find(&kid).is_none())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::permissions::{DELETE_MOVIES, VIEW_MOVIES};
    use auth_test_utils::{
        MockJwksServer, TestRsaKey, TestTokenBuilder, TEST_AUDIENCE, TEST_ISSUER, TEST_KEY_ID_1,
        TEST_KEY_ID_2,
    };

    fn gate_for(server: &MockJwksServer) -> AuthorizationGate {
        AuthorizationGate::new(
            Arc::new(JwksCache::new(server.jwks_url())),
            ClaimsValidator::new(TEST_AUDIENCE.to_string(), TEST_ISSUER.to_string(), 0),
        )
    }

    fn header(token: &str) -> String {
        format!("Bearer {}", token)
    }

    #[tokio::test]
    async fn test_authorize_success() {
        let key = TestRsaKey::primary(TEST_KEY_ID_1);
        let server = MockJwksServer::start(&[&key]).await;
        let gate = gate_for(&server);

        let token = key
            .sign(&TestTokenBuilder::new().for_user("auth0|alice").with_permissions(&[VIEW_MOVIES]).build())
            .unwrap();

        let claims = gate
            .authorize(VIEW_MOVIES, Some(&header(&token)))
            .await
            .unwrap();
        assert_eq!(claims.sub(), Some("auth0|alice"));
    }

    #[tokio::test]
    async fn test_missing_header_skips_key_fetch() {
        let key = TestRsaKey::primary(TEST_KEY_ID_1);
        let server = MockJwksServer::start(&[&key]).await;
        let gate = gate_for(&server);

        let err = gate.authorize(VIEW_MOVIES, None).await.unwrap_err();

        assert!(matches!(err, AuthError::MissingHeader(_)));
        assert_eq!(server.request_count().await, 0);
    }

    #[tokio::test]
    async fn test_permission_checked_after_claims() {
        let key = TestRsaKey::primary(TEST_KEY_ID_1);
        let server = MockJwksServer::start(&[&key]).await;
        let gate = gate_for(&server);

        // Expired and lacking the permission: expiry wins
        let token = key
            .sign(&TestTokenBuilder::new().expires_in(-60).with_permissions(&[]).build())
            .unwrap();

        assert!(matches!(
            gate.authorize(DELETE_MOVIES, Some(&header(&token))).await,
            Err(AuthError::TokenExpired(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_kid_refreshes_once_and_finds_rotated_key() {
        let k1 = TestRsaKey::primary(TEST_KEY_ID_1);
        let k2 = TestRsaKey::secondary(TEST_KEY_ID_2);
        let server = MockJwksServer::start(&[&k1]).await;
        let gate = gate_for(&server).with_min_refresh_interval(Duration::ZERO);

        // Prime the cache with K1 only
        gate.jwks().get_key_set().await.unwrap();

        // Issuer rotates to K2
        server.set_keys(&[&k1, &k2]).await;
        let token = k2
            .sign(&TestTokenBuilder::new().with_permissions(&[VIEW_MOVIES]).build())
            .unwrap();

        assert!(gate.authorize(VIEW_MOVIES, Some(&header(&token))).await.is_ok());
        assert_eq!(gate.jwks().cached_key_count().await, 2);
    }

    #[tokio::test]
    async fn test_unknown_kid_refresh_is_rate_limited() {
        let k1 = TestRsaKey::primary(TEST_KEY_ID_1);
        let k2 = TestRsaKey::secondary(TEST_KEY_ID_2);
        let server = MockJwksServer::start(&[&k1]).await;
        let gate = gate_for(&server).with_min_refresh_interval(Duration::from_secs(60));

        let token = k2.sign(&TestTokenBuilder::new().build()).unwrap();

        for _ in 0..3 {
            assert!(matches!(
                gate.authorize(VIEW_MOVIES, Some(&header(&token))).await,
                Err(AuthError::KeyNotFound(_))
            ));
        }

        // Only the initial fetch; the kid miss fell inside the interval
        assert_eq!(server.request_count().await, 1);
    }

    #[test]
    fn test_kid_is_unknown() {
        let k1 = TestRsaKey::primary(TEST_KEY_ID_1);
        let keys: JwkSet =
            serde_json::from_value(auth_test_utils::jwks_document(&[&k1])).unwrap();

        let known = k1.sign(&TestTokenBuilder::new().build()).unwrap();
        let unknown = TestRsaKey::primary(TEST_KEY_ID_2)
            .sign(&TestTokenBuilder::new().build())
            .unwrap();

        let bearer = |t: &str| extract_bearer_token(Some(&header(t))).unwrap();
        assert!(!kid_is_unknown(&bearer(&known), &keys));
        assert!(kid_is_unknown(&bearer(&unknown), &keys));
        assert!(!kid_is_unknown(&bearer("not-a-jwt"), &keys));
    }
}
