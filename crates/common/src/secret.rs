//! Secret types for protecting bearer tokens from accidental logging.
//!
//! Re-exports from the [`secrecy`] crate. Bearer tokens grant access to
//! whoever holds them, so they are wrapped in [`SecretString`] as soon as
//! they are pulled out of the `Authorization` header. `Debug` output is
//! redacted and the raw value is only reachable via `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! let token = SecretString::from("eyJhbGciOi...");
//! assert!(format!("{token:?}").contains("REDACTED"));
//! assert_eq!(token.expose_secret(), "eyJhbGciOi...");
//! ```

pub use secrecy::{ExposeSecret, SecretString};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("header.payload.signature");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("payload"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("abc.def.ghi");
        assert_eq!(secret.expose_secret(), "abc.def.ghi");
    }
}
