//! Middleware for the casting API.
//!
//! # Components
//!
//! - `auth` - Permission-gated authorization middleware

pub mod auth;

pub use auth::{require_permission, ClaimsExt, PermissionState};
