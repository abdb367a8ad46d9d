//! Auth error types.

use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token failed signature verification or has expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Token could not be encoded.
    #[error("token encoding failed: {0}")]
    Encoding(String),

    /// Google rejected the assertion (bad signature, audience, or shape).
    #[error("google token rejected: {0}")]
    GoogleRejected(String),

    /// Request to Google could not complete.
    #[error("google request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Federated login is not configured.
    #[error("google login not configured")]
    NotConfigured,
}
