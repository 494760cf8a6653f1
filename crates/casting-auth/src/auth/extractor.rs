//! Bearer token extraction from the `Authorization` header.
//!
//! Pure string validation: no network or cryptographic work happens here.

use crate::errors::AuthError;
use common::secret::{ExposeSecret, SecretString};
use std::fmt;

/// Compact JWT pulled from an `Authorization: Bearer <token>` header.
///
/// The raw value is redacted in `Debug` output.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    /// The compact token string (`header.payload.signature`).
    pub fn as_str(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&"[REDACTED]").finish()
    }
}

/// Extract the bearer token from a raw `Authorization` header value.
///
/// # Errors
///
/// - `MissingHeader` if the header is absent, empty, or whitespace only
/// - `MalformedHeader` if the scheme is not `Bearer` (case-insensitive),
///   the token is missing, or there are more than two parts
pub fn extract_bearer_token(header_value: Option<&str>) -> Result<BearerToken, AuthError> {
    let header = match header_value.map(str::trim) {
        Some(h) if !h.is_empty() => h,
        _ => {
            tracing::debug!(target: "auth.extractor", "Missing Authorization header");
            return Err(AuthError::MissingHeader(
                "Authorization header is mandatory.".to_string(),
            ));
        }
    };

    let parts: Vec<&str> = header.split_whitespace().collect();

    match parts.as_slice() {
        [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => {
            tracing::debug!(target: "auth.extractor", "Authorization header has no Bearer scheme");
            Err(AuthError::MalformedHeader(
                "Authorization header must start with \"Bearer\".".to_string(),
            ))
        }
        [_] => {
            tracing::debug!(target: "auth.extractor", "Authorization header has no token");
            Err(AuthError::MalformedHeader("Token not found.".to_string()))
        }
        [_, token] => Ok(BearerToken(SecretString::from(*token))),
        _ => {
            tracing::debug!(
                target: "auth.extractor",
                parts = parts.len(),
                "Authorization header has too many parts"
            );
            Err(AuthError::MalformedHeader(
                "Authorization header must be bearer token.".to_string(),
            ))
        }
    }
}
