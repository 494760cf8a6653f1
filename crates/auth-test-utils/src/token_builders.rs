//! Builder patterns for test data construction
//!
//! Provides fluent APIs for creating test token claims.

use crate::test_ids::{TEST_AUDIENCE, TEST_ISSUER};
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Builder for creating test JWT claims
///
/// Defaults to a token that the casting API accepts: issued by the test
/// tenant, for the test audience, expiring in an hour, with an empty
/// permissions list.
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .for_user("auth0|alice")
///     .with_permissions(&["view:movies", "post:actors"])
///     .expires_in(3600)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    iss: String,
    aud: Value,
    exp: i64,
    iat: i64,
    permissions: Option<Value>,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject".to_string(),
            iss: TEST_ISSUER.to_string(),
            aud: Value::String(TEST_AUDIENCE.to_string()),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            permissions: Some(json!([])),
            extra: Map::new(),
        }
    }

    /// Set the subject (user)
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = issuer.to_string();
        self
    }

    /// Set a single string audience
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = Value::String(audience.to_string());
        self
    }

    /// Set a list audience
    pub fn with_audiences(mut self, audiences: &[&str]) -> Self {
        self.aud = json!(audiences);
        self
    }

    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = Some(json!(permissions));
        self
    }

    /// Set the permissions claim to an arbitrary JSON value
    pub fn with_raw_permissions(mut self, permissions: Value) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Omit the permissions claim entirely
    pub fn without_permissions(mut self) -> Self {
        self.permissions = None;
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set an absolute expiration timestamp
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.exp = timestamp;
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Add or override any claim
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), Value::String(self.sub));
        claims.insert("iss".to_string(), Value::String(self.iss));
        claims.insert("aud".to_string(), self.aud);
        claims.insert("exp".to_string(), json!(self.exp));
        claims.insert("iat".to_string(), json!(self.iat));
        if let Some(permissions) = self.permissions {
            claims.insert("permissions".to_string(), permissions);
        }
        claims.extend(self.extra);
        Value::Object(claims)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creates_valid_claims() {
        let claims = TestTokenBuilder::new()
            .for_user("auth0|alice")
            .with_permissions(&["view:movies"])
            .build();

        assert_eq!(claims["sub"], "auth0|alice");
        assert_eq!(claims["iss"], TEST_ISSUER);
        assert_eq!(claims["aud"], TEST_AUDIENCE);
        assert_eq!(claims["permissions"], json!(["view:movies"]));
        assert!(claims["exp"].as_i64().unwrap() > Utc::now().timestamp());
    }

    #[test]
    fn test_builder_default() {
        let claims = TestTokenBuilder::default().build();
        assert_eq!(claims["sub"], "test-subject");
        assert_eq!(claims["permissions"], json!([]));
    }

    #[test]
    fn test_without_permissions_omits_claim() {
        let claims = TestTokenBuilder::new().without_permissions().build();
        assert!(claims.get("permissions").is_none());
    }

    #[test]
    fn test_with_claim_overrides() {
        let claims = TestTokenBuilder::new()
            .with_claim("exp", json!("tomorrow"))
            .build();
        assert_eq!(claims["exp"], "tomorrow");
    }
}
