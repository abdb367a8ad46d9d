//! Shared application state.

use std::sync::Arc;

use auth::GoogleVerifier;
use gemini_brain::GeminiBrain;
use store::{TranscriptStore, UserStore};

use crate::config::AppConfig;

/// State handed to every handler. All heavy members sit behind `Arc` so the
/// router can clone freely.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
    pub transcripts: Arc<TranscriptStore>,
    pub brain: Arc<GeminiBrain>,
    /// None when Google login is not configured.
    pub google: Option<Arc<GoogleVerifier>>,
    pub config: Arc<AppConfig>,
}
