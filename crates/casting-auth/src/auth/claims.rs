//! Claims validation for signature-verified tokens.
//!
//! Turns an [`UnvalidatedClaims`] payload into a [`ClaimSet`] once expiry,
//! audience and issuer all check out. The `sub` field is redacted in Debug
//! output to prevent exposure in logs.

use crate::auth::jwt::UnvalidatedClaims;
use crate::config::AuthConfig;
use crate::errors::AuthError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const INCORRECT_CLAIMS: &str = "Incorrect claims. Please check the audience and the issuer.";

/// The `aud` claim: a single audience or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    /// Whether `expected` equals the audience or is one of them.
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == expected,
            Audience::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

/// Validated claims of an authorized token.
///
/// Only [`ClaimsValidator`] constructs one, and only from a payload whose
/// signature verified.
#[derive(Clone, PartialEq, Serialize)]
pub struct ClaimSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<String>,

    exp: i64,

    aud: Audience,

    iss: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<Vec<String>>,
}

/// Custom Debug implementation that redacts the `sub` field.
impl fmt::Debug for ClaimSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimSet")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("aud", &self.aud)
            .field("iss", &self.iss)
            .field("iat", &self.iat)
            .field("permissions", &self.permissions)
            .finish()
    }
}

impl ClaimSet {
    /// Subject (Auth0 user id), if the token carries one.
    pub fn sub(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    /// Expiration timestamp (Unix epoch seconds).
    pub fn expires_at(&self) -> i64 {
        self.exp
    }

    /// Audience the token was issued for.
    pub fn audience(&self) -> &Audience {
        &self.aud
    }

    /// Issuer, already checked against the expected one.
    pub fn issuer(&self) -> &str {
        &self.iss
    }

    /// Issued-at timestamp (Unix epoch seconds), if present and numeric.
    pub fn issued_at(&self) -> Option<i64> {
        self.iat
    }

    /// The `permissions` claim, or `None` if the token has none at all.
    pub fn permissions(&self) -> Option<&[String]> {
        self.permissions.as_deref()
    }

    /// Whether the token grants `permission`. False when the claim is absent.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions()
            .is_some_and(|granted| granted.iter().any(|p| p == permission))
    }
}

/// Required claims other than `exp`, parsed after expiry has been checked.
#[derive(Deserialize)]
struct RemainingClaims {
    #[serde(default)]
    sub: Option<String>,
    aud: Audience,
    iss: String,
}

/// Checks expiry, audience and issuer of a verified payload.
#[derive(Debug, Clone)]
pub struct ClaimsValidator {
    expected_audience: String,
    expected_issuer: String,
    leeway_seconds: i64,
}

impl ClaimsValidator {
    /// Create a validator.
    ///
    /// # Arguments
    ///
    /// * `expected_audience` - API identifier the token must be issued for
    /// * `expected_issuer` - exact issuer, e.g. `https://tenant.auth0.com/`
    /// * `leeway_seconds` - grace period added to `exp`
    pub fn new(expected_audience: String, expected_issuer: String, leeway_seconds: u64) -> Self {
        Self {
            expected_audience,
            expected_issuer,
            leeway_seconds: i64::try_from(leeway_seconds).unwrap_or(i64::MAX),
        }
    }

    /// Create a validator for the configured audience, issuer and leeway.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.api_audience.clone(),
            config.issuer(),
            config.jwt_leeway_seconds,
        )
    }

    /// Validate against the current wall-clock time.
    ///
    /// # Errors
    ///
    /// See [`ClaimsValidator::validate_at`].
    pub fn validate(&self, payload: &UnvalidatedClaims) -> Result<ClaimSet, AuthError> {
        self.validate_at(payload, unix_now())
    }

    /// Validate as of `now` (Unix epoch seconds).
    ///
    /// Expiry is checked first, so an expired token is reported as expired
    /// even if its other claims are also wrong.
    ///
    /// # Errors
    ///
    /// - `TokenExpired` - `now` is not strictly before `exp` plus leeway
    /// - `InvalidClaims` - `exp`, `aud` or `iss` missing or malformed,
    ///   audience or issuer mismatch, or a malformed `permissions` claim
    pub fn validate_at(&self, payload: &UnvalidatedClaims, now: i64) -> Result<ClaimSet, AuthError> {
        let exp = payload.get("exp").and_then(numeric_date).ok_or_else(|| {
            tracing::debug!(target: "auth.claims", "Token exp claim missing or not numeric");
            AuthError::InvalidClaims(INCORRECT_CLAIMS.to_string())
        })?;

        if now >= exp.saturating_add(self.leeway_seconds) {
            tracing::debug!(target: "auth.claims", exp = exp, now = now, "Token expired");
            return Err(AuthError::TokenExpired("Token expired.".to_string()));
        }

        let remaining: RemainingClaims =
            serde_json::from_value(Value::Object(payload.as_map().clone())).map_err(|e| {
                tracing::debug!(target: "auth.claims", error = %e, "Token claims malformed");
                AuthError::InvalidClaims(INCORRECT_CLAIMS.to_string())
            })?;

        if !remaining.aud.contains(&self.expected_audience) {
            tracing::debug!(target: "auth.claims", aud = ?remaining.aud, "Token audience mismatch");
            return Err(AuthError::InvalidClaims(INCORRECT_CLAIMS.to_string()));
        }

        if remaining.iss != self.expected_issuer {
            tracing::debug!(target: "auth.claims", iss = %remaining.iss, "Token issuer mismatch");
            return Err(AuthError::InvalidClaims(INCORRECT_CLAIMS.to_string()));
        }

        let permissions = parse_permissions(payload.get("permissions"))?;

        Ok(ClaimSet {
            sub: remaining.sub,
            exp,
            aud: remaining.aud,
            iss: remaining.iss,
            // Optional and never enforced; a malformed value is dropped
            iat: payload.get("iat").and_then(numeric_date),
            permissions,
        })
    }
}

/// A NumericDate as whole seconds. Fractional values are truncated.
#[allow(clippy::cast_possible_truncation)]
fn numeric_date(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        _ => None,
    }
}

/// Absent stays `None`; anything present must be an array of strings.
fn parse_permissions(value: Option<&Value>) -> Result<Option<Vec<String>>, AuthError> {
    let Some(value) = value else {
        return Ok(None);
    };

    serde_json::from_value::<Vec<String>>(value.clone())
        .map(Some)
        .map_err(|e| {
            tracing::debug!(target: "auth.claims", error = %e, "Token permissions claim malformed");
            AuthError::InvalidClaims("Permissions claim must be a list of strings.".to_string())
        })
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
