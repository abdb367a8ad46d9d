//! Gemini-backed reply gateway for Solace.
//!
//! [`GeminiBrain`] turns a user message plus recent transcript into an
//! assistant reply by calling Google's generative-language API. It rotates
//! through a pool of API keys on failure and falls back across API versions
//! and a fixed default model before giving up. Upstream failure never
//! escapes: [`GeminiBrain::reply`] always produces text, degrading to one of
//! two static replies when nothing upstream worked.

mod api_types;
mod brain;
mod config;
mod error;
mod prompt;

pub use brain::{GeminiBrain, EXHAUSTED_REPLY, NOT_CONFIGURED_REPLY};
pub use config::{GeminiBrainConfig, GeminiBrainConfigBuilder, DEFAULT_SYSTEM_PROMPT};
pub use error::BrainError;
pub use prompt::{build_prompt, ASSISTANT_LABEL, USER_LABEL};
