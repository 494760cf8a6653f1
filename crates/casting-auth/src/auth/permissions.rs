//! Permission checks against the `permissions` claim.
//!
//! Auth0 RBAC puts the granted API permissions in a `permissions` array.
//! The strings used by the casting API are listed below.

use crate::auth::claims::ClaimSet;
use crate::errors::AuthError;

pub const VIEW_MOVIES: &str = "view:movies";
pub const VIEW_ACTORS: &str = "view:actors";
pub const POST_MOVIES: &str = "post:movies";
pub const POST_ACTORS: &str = "post:actors";
pub const UPDATE_MOVIES: &str = "update:movies";
pub const UPDATE_ACTORS: &str = "update:actors";
pub const DELETE_MOVIES: &str = "delete:movies";
pub const DELETE_ACTORS: &str = "delete:actors";

/// All permissions the casting API defines.
pub const ALL_PERMISSIONS: [&str; 8] = [
    VIEW_MOVIES,
    VIEW_ACTORS,
    POST_MOVIES,
    POST_ACTORS,
    UPDATE_MOVIES,
    UPDATE_ACTORS,
    DELETE_MOVIES,
    DELETE_ACTORS,
];

/// Check that `claims` grants `required`.
///
/// An empty `required` demands no specific permission, but the claim itself
/// must still be present.
///
/// # Errors
///
/// - `MissingPermissionsClaim` - the token has no `permissions` claim at all
/// - `Forbidden` - the claim is present but does not contain `required`
pub fn check_permission(required: &str, claims: &ClaimSet) -> Result<(), AuthError> {
    let Some(granted) = claims.permissions() else {
        tracing::debug!(target: "auth.permissions", "Token has no permissions claim");
        return Err(AuthError::MissingPermissionsClaim(
            "Permissions not included in JWT.".to_string(),
        ));
    };

    if required.is_empty() || granted.iter().any(|p| p == required) {
        return Ok(());
    }

    tracing::debug!(
        target: "auth.permissions",
        required = %required,
        granted = granted.len(),
        "Required permission not granted"
    );
    Err(AuthError::Forbidden("Permission not found.".to_string()))
}
