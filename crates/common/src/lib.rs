//! Common utilities shared across EventEase crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (size limits, clock skew, header inspection)
pub mod jwt;
