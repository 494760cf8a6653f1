//! Authorization middleware for protected routes.
//!
//! Runs the [`AuthorizationGate`] for the route's required permission and
//! injects the validated claims into request extensions.

use crate::auth::{AuthorizationGate, ClaimSet};
use crate::errors::AuthError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authorization middleware.
///
/// One per protected route (or group of routes sharing a permission); all
/// of them share the same gate and therefore the same key set cache.
#[derive(Clone)]
pub struct PermissionState {
    /// Gate with the shared JWKS cache.
    pub gate: Arc<AuthorizationGate>,

    /// Permission the route requires, e.g. `delete:movies`.
    pub permission: &'static str,
}

impl PermissionState {
    /// State for a route guarded by `permission`.
    pub fn new(gate: Arc<AuthorizationGate>, permission: &'static str) -> Self {
        Self { gate, permission }
    }
}

/// Authorization middleware that validates the bearer token and permission.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - Renders the `AuthError` (401, 400, 403 or 500) if authorization fails
/// - Continues to next handler with the `ClaimSet` in extensions otherwise
///
/// # Example
///
/// ```rust,ignore
/// let state = PermissionState::new(gate, DELETE_MOVIES);
/// let app = Router::new()
///     .route("/movies/:id", delete(delete_movie))
///     .route_layer(middleware::from_fn_with_state(state, require_permission));
/// ```
#[instrument(skip_all, name = "auth.middleware.require_permission")]
pub async fn require_permission(
    State(state): State<PermissionState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AuthError> {
    // A header that is not visible ASCII is treated like a malformed one
    let auth_header = match req.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => Some(value.to_str().map_err(|_| {
            tracing::debug!(target: "auth.middleware", "Authorization header is not valid ASCII");
            AuthError::MalformedHeader("Authorization header must be bearer token.".to_string())
        })?),
    };

    let claims = state.gate.authorize(state.permission, auth_header).await?;

    // Store claims in request extensions for downstream handlers
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extension trait for extracting claims from request.
pub trait ClaimsExt {
    /// Get the validated claims from request extensions.
    ///
    /// Returns `None` if the middleware was not applied to this request.
    fn claims(&self) -> Option<&ClaimSet>;
}

impl<B> ClaimsExt for axum::http::Request<B> {
    fn claims(&self) -> Option<&ClaimSet> {
        self.extensions().get::<ClaimSet>()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    // Full middleware tests with a mock JWKS endpoint live in
    // tests/middleware_tests.rs.

    use super::*;

    #[test]
    fn test_permission_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<PermissionState>();
    }

    #[test]
    fn test_claims_absent_without_middleware() {
        let req = axum::http::Request::builder()
            .uri("/movies")
            .body(())
            .unwrap();
        assert!(req.claims().is_none());
    }
}
