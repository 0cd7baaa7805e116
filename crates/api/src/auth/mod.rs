//! Authentication primitives.
//!
//! Tokens are issued elsewhere; this service only verifies them.

pub mod jwt;
