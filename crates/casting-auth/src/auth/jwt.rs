//! RS256 signature verification against the cached key set.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (via `common::jwt`)
//! - The header is decoded untrusted and used only to select a key
//! - Only RS256 is accepted, even when a matching key exists, so a token
//!   cannot pick `none` or an HMAC algorithm keyed with the public modulus
//! - A payload is returned only after its signature verified; expiry,
//!   audience and issuer are checked later by the claims validator

use crate::auth::extractor::BearerToken;
use crate::auth::jwks::{Jwk, JwkSet};
use crate::errors::AuthError;
use common::jwt::{decode_unverified_header, JwtValidationError, ACCEPTED_ALGORITHM};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

const KEY_NOT_FOUND: &str = "Unable to find the appropriate key";
const MALFORMED: &str = "Authorization malformed.";

/// Payload of a token whose signature verified but whose claims have not
/// been validated yet.
///
/// Only [`verify_signature`] produces one. Claim values are hidden in
/// `Debug` output; only claim names are shown.
#[derive(Clone, PartialEq)]
pub struct UnvalidatedClaims(Map<String, Value>);

impl UnvalidatedClaims {
    /// Look up a raw claim by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// All claims as a JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_map(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}

impl fmt::Debug for UnvalidatedClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnvalidatedClaims")
            .field("claims", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Verify the token's RS256 signature with the key its `kid` selects.
///
/// # Security Checks
///
/// 1. Size and shape check of the untrusted header
/// 2. `kid` must be present
/// 3. `kid` must match a key in `keys`
/// 4. Header must declare RS256
/// 5. Matched key must be a usable RSA signing key
/// 6. Signature must verify over header and payload
///
/// # Errors
///
/// - `MalformedHeader` - oversized or malformed token, or no `kid`
/// - `KeyNotFound` - no key with that `kid`, or the key cannot verify RS256
/// - `UnsupportedAlgorithm` - header declares anything other than RS256
/// - `InvalidSignature` - signature does not verify
/// - `InvalidClaims` - payload is not a JSON object
pub fn verify_signature(token: &BearerToken, keys: &JwkSet) -> Result<UnvalidatedClaims, AuthError> {
    let header = decode_unverified_header(token.as_str()).map_err(|e| match e {
        JwtValidationError::TokenTooLarge => {
            AuthError::MalformedHeader("Token exceeds the maximum allowed size.".to_string())
        }
        JwtValidationError::MalformedToken | JwtValidationError::MissingKid => {
            AuthError::MalformedHeader(MALFORMED.to_string())
        }
    })?;

    let kid = header.kid.as_deref().ok_or_else(|| {
        tracing::debug!(target: "auth.jwt", "Token header has no kid");
        AuthError::MalformedHeader(MALFORMED.to_string())
    })?;

    let jwk = keys.find(kid).ok_or_else(|| {
        tracing::debug!(target: "auth.jwt", kid = %kid, key_count = keys.len(), "No JWK matches token kid");
        AuthError::KeyNotFound(KEY_NOT_FOUND.to_string())
    })?;

    if !header.declares_accepted_algorithm() {
        tracing::warn!(target: "auth.jwt", alg = %header.alg, "Token declares unsupported algorithm");
        return Err(AuthError::UnsupportedAlgorithm(format!(
            "Only {} tokens are accepted.",
            ACCEPTED_ALGORITHM
        )));
    }

    let decoding_key = decoding_key_for(jwk)?;

    let token_data = decode::<Map<String, Value>>(token.as_str(), &decoding_key, &signature_only())
        .map_err(|e| {
            tracing::debug!(target: "auth.jwt", error = %e, "Token verification failed");
            map_decode_error(e.kind())
        })?;

    tracing::debug!(target: "auth.jwt", kid = %kid, "Token signature verified");
    Ok(UnvalidatedClaims(token_data.claims))
}

/// Build an RSA decoding key, rejecting JWKs that cannot verify RS256.
fn decoding_key_for(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    let unusable = |reason: &str| {
        tracing::warn!(target: "auth.jwt", kid = ?jwk.kid, reason = reason, "Matched JWK is unusable");
        AuthError::KeyNotFound(KEY_NOT_FOUND.to_string())
    };

    if jwk.kty != "RSA" {
        return Err(unusable("key type is not RSA"));
    }
    if jwk.alg.as_deref().is_some_and(|alg| alg != ACCEPTED_ALGORITHM) {
        return Err(unusable("key algorithm is not RS256"));
    }
    if jwk.key_use.as_deref() == Some("enc") {
        return Err(unusable("key is for encryption"));
    }

    let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
        return Err(unusable("key has no modulus or exponent"));
    };

    DecodingKey::from_rsa_components(n, e).map_err(|_| unusable("invalid modulus or exponent"))
}

/// Signature and algorithm only. Time and audience checks belong to the
/// claims validator so that their failures map to their own error kinds.
fn signature_only() -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();
    validation
}

fn map_decode_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature => {
            AuthError::InvalidSignature("Token signature is invalid.".to_string())
        }
        ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => AuthError::UnsupportedAlgorithm(
            format!("Only {} tokens are accepted.", ACCEPTED_ALGORITHM),
        ),
        ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
            AuthError::KeyNotFound(KEY_NOT_FOUND.to_string())
        }
        ErrorKind::Json(_) => {
            AuthError::InvalidClaims("Unable to parse authentication token.".to_string())
        }
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
            AuthError::MalformedHeader(MALFORMED.to_string())
        }
        _ => AuthError::InvalidSignature("Token signature is invalid.".to_string()),
    }
}
