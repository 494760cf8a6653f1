//! Casting API authorization layer.
//!
//! Gates the casting agency's protected operations behind Auth0-issued RS256
//! access tokens. Each protected operation calls
//! [`AuthorizationGate::authorize`](auth::AuthorizationGate::authorize) with
//! the permission it needs and the raw `Authorization` header, and gets
//! back either the validated claims or a categorized [`AuthError`](errors::AuthError).
//!
//! # Pipeline
//!
//! ```text
//! header -> bearer token -> (JWKS) verified payload -> validated claims -> permission
//! ```
//!
//! # Modules
//!
//! - `auth` - The pipeline stages and the gate composing them
//! - `config` - Configuration from environment
//! - `errors` - Error kinds with HTTP status code mapping
//! - `middleware` - axum adapter for protected routes
//! - `observability` - Metrics

pub mod auth;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod observability;
