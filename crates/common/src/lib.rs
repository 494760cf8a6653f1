//! Common utilities shared by the casting agency authorization crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (size limits, unverified header decoding)
pub mod jwt;
