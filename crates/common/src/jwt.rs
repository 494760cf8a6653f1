//! JWT utilities shared by the authorization core and its test fixtures.
//!
//! This module provides:
//! - Size limits for DoS prevention
//! - Clock leeway bounds for expiry validation
//! - Unverified header decoding (`alg`, `kid`) for key lookup
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Nothing decoded here is trusted; the header only selects a key and the
//!   token MUST still be signature-verified against that key
//! - Only RS256 is accepted by the verifier; see [`ACCEPTED_ALGORITHM`]
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{decode_unverified_header, ACCEPTED_ALGORITHM};
//!
//! let header = decode_unverified_header(token)?;
//! let kid = header.kid.ok_or("missing kid")?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical Auth0 access tokens with a permissions claim are well under 2KB.
/// Anything larger is rejected before base64 decoding or signature work.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Maximum allowed leeway applied to the `exp` claim (10 minutes).
///
/// Prevents misconfiguration from turning expiry into a suggestion.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// The only signing algorithm accepted for access tokens.
pub const ACCEPTED_ALGORITHM: &str = "RS256";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while decoding the unverified part of a JWT.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("Token exceeds the maximum allowed size")]
    TokenTooLarge,

    /// Token format is invalid (not three base64url segments with a JSON header).
    #[error("Authorization malformed.")]
    MalformedToken,

    /// Token header has no usable `kid`.
    #[error("Authorization malformed.")]
    MissingKid,
}

// =============================================================================
// Header Types
// =============================================================================

/// JOSE header fields read before verification.
///
/// Untrusted: used only to pick a key from the JWKS and to reject
/// algorithms other than [`ACCEPTED_ALGORITHM`] early.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    /// Declared signing algorithm (e.g., "RS256").
    pub alg: String,

    /// Key ID; empty strings are normalized to `None`.
    #[serde(default)]
    pub kid: Option<String>,

    /// Token type, usually "JWT".
    #[serde(default)]
    pub typ: Option<String>,
}

impl TokenHeader {
    /// Whether the declared algorithm is the accepted one.
    #[must_use]
    pub fn declares_accepted_algorithm(&self) -> bool {
        self.alg == ACCEPTED_ALGORITHM
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Decode the JOSE header of a compact JWT without verifying it.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` - not three segments, bad base64url, or header is not
///   a JSON object with a string `alg`
pub fn decode_unverified_header(token: &str) -> Result<TokenHeader, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let mut header: TokenHeader = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    if header.kid.as_deref().is_some_and(str::is_empty) {
        header.kid = None;
    }

    Ok(header)
}

/// Extract the `kid` (key ID) from a JWT header without verifying the signature.
///
/// # Errors
///
/// Everything [`decode_unverified_header`] returns (including
/// `MalformedToken` for a non-string `kid`), plus `MissingKid` when the
/// header has no `kid` or an empty one.
pub fn extract_kid(token: &str) -> Result<String, JwtValidationError> {
    decode_unverified_header(token)?
        .kid
        .ok_or(JwtValidationError::MissingKid)
}

// =============================================================================
// Tests
// =============================================================================
