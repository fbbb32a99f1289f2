//! Session token authentication.
//!
//! - `claims` - Token claims and the identity they carry
//! - `token` - HS256 issue/verify

pub mod claims;
pub mod token;

pub use claims::{Claims, Identity};
pub use token::{TokenCodec, TokenError};
