//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used across EventEase. `SecretString`
//! implements `Debug` with redaction, so a struct deriving `Debug` that holds
//! one cannot leak it through `{:?}` or tracing fields. Secrets are zeroized
//! on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LoginRequest {
//!     email: String,
//!     password: SecretString,
//! }
//!
//! let req = LoginRequest {
//!     email: "alice@example.com".to_string(),
//!     password: SecretString::from("hunter22"),
//! };
//!
//! assert!(!format!("{req:?}").contains("hunter22"));
//! let password: &str = req.password.expose_secret();
//! assert_eq!(password, "hunter22");
//! ```
//!
//! Use `SecretString` for:
//! - User passwords in login and registration payloads
//! - The session token signing secret (`JWT_SECRET`)
//! - Issued bearer tokens held in test fixtures

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
