//! # Auth Test Utilities
//!
//! Shared test utilities for the casting API authorization layer.
//!
//! This crate provides:
//! - Deterministic RSA fixtures (fixed keys for reproducible signatures)
//! - Test claim builders (TestTokenBuilder)
//! - A mock JWKS endpoint (MockJwksServer)
//! - Fixed test identifiers (domain, audience, key IDs)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let key = TestRsaKey::primary(TEST_KEY_ID_1);
//!     let jwks = MockJwksServer::start(&[&key]).await;
//!
//!     let claims = TestTokenBuilder::new()
//!         .for_user("auth0|alice")
//!         .with_permissions(&["view:movies"])
//!         .build();
//!     let token = key.sign(&claims)?;
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_server;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_server::*;
pub use test_ids::*;
pub use token_builders::*;
