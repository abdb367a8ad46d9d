//! Error types for gateway attempts.
//!
//! These never escape [`crate::GeminiBrain::reply`]; they exist so the
//! rotation loop can log why each key was skipped.

use thiserror::Error;

/// Errors that can occur while attempting an upstream call.
#[derive(Debug, Error)]
pub enum BrainError {
    /// HTTP client could not be constructed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Request did not complete (connect, timeout, decode).
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Model discovery produced no usable model.
    #[error("no model supporting content generation")]
    NoAvailableModel,

    /// The service answered but produced no text.
    #[error("upstream produced no reply text")]
    EmptyReply,
}
