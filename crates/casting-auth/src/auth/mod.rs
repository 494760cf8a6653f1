//! Bearer-token authorization.
//!
//! # Components
//!
//! - `extractor` - pulls the token out of the `Authorization` header
//! - `jwks` - cached, single-flight fetch of the issuer's key set
//! - `jwt` - RS256 signature verification
//! - `claims` - expiry, audience and issuer validation
//! - `permissions` - `permissions` claim membership
//! - `gate` - the composed pipeline

pub mod claims;
pub mod extractor;
pub mod gate;
pub mod jwks;
pub mod jwt;
pub mod permissions;

pub use claims::{Audience, ClaimSet, ClaimsValidator};
pub use extractor::{extract_bearer_token, BearerToken};
pub use gate::AuthorizationGate;
pub use jwks::{Jwk, JwkSet, JwksCache};
pub use jwt::{verify_signature, UnvalidatedClaims};
pub use permissions::check_permission;
