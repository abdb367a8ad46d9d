//! Flat-file JSON persistence for Solace.
//!
//! Two documents live on disk: `users.json` maps email to [`User`] records,
//! and `chat_history.json` maps user id to an ordered list of [`Turn`]s.
//! Each store loads its file fully into memory at startup and rewrites it
//! in full on every mutation. Writes are best-effort: failures are logged
//! and swallowed, so callers never see an I/O error on the hot path.

mod error;
mod models;
mod transcripts;
mod users;

pub use error::{Result, StoreError};
pub use models::{Role, Turn, User};
pub use transcripts::{TranscriptStore, MAX_TURNS, REPLAY_TURNS};
pub use users::UserStore;
