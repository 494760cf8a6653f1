//! Authorization error types.
//!
//! Every failure of the authorization pipeline is an [`AuthError`]. The set
//! of variants is closed and each maps to exactly one HTTP status code:
//!
//! - MissingHeader, MalformedHeader, UnsupportedAlgorithm, InvalidSignature,
//!   TokenExpired, InvalidClaims: 401 Unauthorized
//! - KeyNotFound, MissingPermissionsClaim: 400 Bad Request
//! - Forbidden: 403 Forbidden
//! - NetworkFailure: 500 Internal Server Error
//!
//! The variant itself is the error kind and is never collapsed into a
//! generic "unauthenticated" result on the way back to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Authorization failure, categorized by kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing authorization header: {0}")]
    MissingHeader(String),

    #[error("Malformed authorization header: {0}")]
    MalformedHeader(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Signing key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Token expired: {0}")]
    TokenExpired(String),

    #[error("Invalid claims: {0}")]
    InvalidClaims(String),

    #[error("Key set unavailable: {0}")]
    NetworkFailure(String),

    #[error("Missing permissions claim: {0}")]
    MissingPermissionsClaim(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MissingHeader(_)
            | AuthError::MalformedHeader(_)
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::InvalidSignature(_)
            | AuthError::TokenExpired(_)
            | AuthError::InvalidClaims(_) => 401,
            AuthError::KeyNotFound(_) | AuthError::MissingPermissionsClaim(_) => 400,
            AuthError::Forbidden(_) => 403,
            AuthError::NetworkFailure(_) => 500,
        }
    }

    /// Stable machine-readable code, also used as the metrics outcome label.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader(_) => "authorization_header_missing",
            AuthError::MalformedHeader(_) => "invalid_header",
            AuthError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            AuthError::KeyNotFound(_) => "key_not_found",
            AuthError::InvalidSignature(_) => "invalid_signature",
            AuthError::TokenExpired(_) => "token_expired",
            AuthError::InvalidClaims(_) => "invalid_claims",
            AuthError::NetworkFailure(_) => "jwks_unavailable",
            AuthError::MissingPermissionsClaim(_) => "missing_permissions_claim",
            AuthError::Forbidden(_) => "forbidden",
        }
    }

    /// Human-readable description carried by the error.
    pub fn description(&self) -> &str {
        match self {
            AuthError::MissingHeader(d)
            | AuthError::MalformedHeader(d)
            | AuthError::UnsupportedAlgorithm(d)
            | AuthError::KeyNotFound(d)
            | AuthError::InvalidSignature(d)
            | AuthError::TokenExpired(d)
            | AuthError::InvalidClaims(d)
            | AuthError::NetworkFailure(d)
            | AuthError::MissingPermissionsClaim(d)
            | AuthError::Forbidden(d) => d,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match &self {
            AuthError::NetworkFailure(reason) => {
                // Log actual reason server-side, return generic message to client
                tracing::error!(target: "auth.errors", reason = %reason, "JWKS unavailable");
                "Unable to verify credentials at this time".to_string()
            }
            other => other.description().to_string(),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            let header = format!(
                "Bearer realm=\"casting-api\", error=\"invalid_token\", error_description=\"{}\"",
                self.code()
            );
            if let Ok(header_value) = header.parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn all_kinds() -> Vec<AuthError> {
        vec![
            AuthError::MissingHeader("d".to_string()),
            AuthError::MalformedHeader("d".to_string()),
            AuthError::UnsupportedAlgorithm("d".to_string()),
            AuthError::KeyNotFound("d".to_string()),
            AuthError::InvalidSignature("d".to_string()),
            AuthError::TokenExpired("d".to_string()),
            AuthError::InvalidClaims("d".to_string()),
            AuthError::NetworkFailure("d".to_string()),
            AuthError::MissingPermissionsClaim("d".to_string()),
            AuthError::Forbidden("d".to_string()),
        ]
    }

    #[test]
    fn test_status_codes() {
        let statuses: Vec<u16> = all_kinds().iter().map(AuthError::status_code).collect();
        assert_eq!(statuses, vec![401, 401, 401, 400, 401, 401, 401, 500, 400, 403]);
    }

    #[test]
    fn test_codes_are_distinct() {
        let mut codes: Vec<&str> = all_kinds().iter().map(AuthError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 10);
    }

    #[test]
    fn test_description_returns_payload() {
        let error = AuthError::Forbidden("Permission not found.".to_string());
        assert_eq!(error.description(), "Permission not found.");
    }

    #[test]
    fn test_display_includes_kind_and_description() {
        let error = AuthError::KeyNotFound("Unable to find the appropriate key".to_string());
        assert_eq!(
            format!("{}", error),
            "Signing key not found: Unable to find the appropriate key"
        );
    }

    #[tokio::test]
    async fn test_into_response_unauthorized_has_www_authenticate() {
        let error = AuthError::TokenExpired("Token expired.".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let www_auth = response.headers().get("WWW-Authenticate").unwrap();
        let www_auth_str = www_auth.to_str().unwrap();
        assert!(www_auth_str.contains("Bearer realm=\"casting-api\""));
        assert!(www_auth_str.contains("token_expired"));

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "token_expired");
        assert_eq!(body_json["error"]["message"], "Token expired.");
    }

    #[tokio::test]
    async fn test_into_response_forbidden() {
        let error = AuthError::Forbidden("Permission not found.".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get("WWW-Authenticate").is_none());

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "forbidden");
        assert_eq!(body_json["error"]["message"], "Permission not found.");
    }

    #[tokio::test]
    async fn test_into_response_key_not_found_is_bad_request() {
        let error = AuthError::KeyNotFound("Unable to find the appropriate key".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "key_not_found");
    }

    #[tokio::test]
    async fn test_into_response_network_failure_hides_detail() {
        let error = AuthError::NetworkFailure("connection refused to 10.0.0.7".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "jwks_unavailable");
        assert_eq!(
            body_json["error"]["message"],
            "Unable to verify credentials at this time"
        );
    }
}
