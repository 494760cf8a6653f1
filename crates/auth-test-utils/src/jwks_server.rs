//! Mock JWKS endpoint for integration tests
//!
//! Wraps a [`wiremock::MockServer`] serving `/.well-known/jwks.json`, the
//! path an Auth0 tenant publishes its signing keys under.

use crate::crypto_fixtures::TestRsaKey;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the key set document.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// A running mock JWKS endpoint.
///
/// # Example
/// ```rust,ignore
/// let key = TestRsaKey::primary(TEST_KEY_ID_1);
/// let server = MockJwksServer::start(&[&key]).await;
/// let cache = JwksCache::new(server.jwks_url());
/// ```
pub struct MockJwksServer {
    server: MockServer,
}

impl MockJwksServer {
    /// Start a server publishing the public halves of `keys`.
    pub async fn start(keys: &[&TestRsaKey]) -> Self {
        let server = MockServer::start().await;
        let this = Self { server };
        this.set_keys(keys).await;
        this
    }

    /// Start a server publishing `document` verbatim.
    pub async fn start_with_document(document: Value) -> Self {
        let server = MockServer::start().await;
        let this = Self { server };
        this.set_document(document).await;
        this
    }

    /// Full URL of the key set document.
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Replace the published key set with `keys`.
    pub async fn set_keys(&self, keys: &[&TestRsaKey]) {
        self.set_document(jwks_document(keys)).await;
    }

    /// Replace the published document with `document`.
    pub async fn set_document(&self, document: Value) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(document))
            .mount(&self.server)
            .await;
    }

    /// Publish `keys` behind a response delay.
    pub async fn set_keys_with_delay(&self, keys: &[&TestRsaKey], delay: Duration) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(jwks_document(keys))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Make every subsequent fetch fail with `status`.
    pub async fn fail_with(&self, status: u16) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Make every subsequent fetch fail with `status` after `delay`.
    pub async fn fail_with_delay(&self, status: u16, delay: Duration) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(status).set_delay(delay))
            .mount(&self.server)
            .await;
    }

    /// Number of key set requests received since the last reset.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}

/// JWKS document publishing the public halves of `keys`.
pub fn jwks_document(keys: &[&TestRsaKey]) -> Value {
    json!({ "keys": keys.iter().map(|k| k.jwk_json()).collect::<Vec<_>>() })
}
