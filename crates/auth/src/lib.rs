//! Authentication primitives for Solace.
//!
//! Three concerns live here:
//!
//! - [`token`] - stateless HS256 session tokens with a 24 hour expiry
//! - [`password`] - SHA-256 password hashing with constant-time verification
//! - [`google`] - Google ID-token verification and OAuth code exchange

mod error;
mod google;
mod password;
mod token;

pub use error::AuthError;
pub use google::{GoogleProfile, GoogleVerifier};
pub use password::{hash_password, verify_password};
pub use token::{issue, validate, TOKEN_TTL_HOURS};
