//! Conversation transcript store with bounded history.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::warn;

use crate::models::Turn;

/// Maximum number of turns kept on disk per user.
pub const MAX_TURNS: usize = 20;

/// Number of recent turns replayed into the outbound prompt.
pub const REPLAY_TURNS: usize = 10;

/// Flat-file store of per-user conversation transcripts.
///
/// Each user maps to an ordered list of turns. Appends truncate to the
/// newest [`MAX_TURNS`] entries, oldest first to go. Like [`crate::UserStore`],
/// the whole document is rewritten on every mutation and write failures are
/// swallowed after a warning.
#[derive(Debug)]
pub struct TranscriptStore {
    path: PathBuf,
    transcripts: RwLock<HashMap<String, Vec<Turn>>>,
}

impl TranscriptStore {
    /// Load the store from `path`, starting empty when the file is missing
    /// or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let transcripts = load_map(&path);
        Self {
            path,
            transcripts: RwLock::new(transcripts),
        }
    }

    /// Seed an empty transcript for a newly registered user.
    pub async fn init_user(&self, user_id: &str) {
        let mut transcripts = self.transcripts.write().await;
        transcripts.entry(user_id.to_string()).or_default();
        self.persist(&transcripts).await;
    }

    /// Append a user turn and the model's reply, then truncate to the
    /// newest [`MAX_TURNS`]. Both turns of the exchange survive truncation
    /// together as long as they fit in the window.
    pub async fn append_exchange(&self, user_id: &str, user_text: &str, model_text: &str) {
        let mut transcripts = self.transcripts.write().await;
        let turns = transcripts.entry(user_id.to_string()).or_default();

        turns.push(Turn::user(user_text));
        turns.push(Turn::model(model_text));

        if turns.len() > MAX_TURNS {
            let excess = turns.len() - MAX_TURNS;
            turns.drain(0..excess);
        }

        self.persist(&transcripts).await;
    }

    /// The last `n` turns for a user, oldest first.
    pub async fn recent(&self, user_id: &str, n: usize) -> Vec<Turn> {
        let transcripts = self.transcripts.read().await;
        match transcripts.get(user_id) {
            Some(turns) => {
                let start = turns.len().saturating_sub(n);
                turns[start..].to_vec()
            }
            None => Vec::new(),
        }
    }

    /// Total number of stored turns for a user.
    pub async fn len(&self, user_id: &str) -> usize {
        let transcripts = self.transcripts.read().await;
        transcripts.get(user_id).map(Vec::len).unwrap_or(0)
    }

    /// Whether the user has no stored turns.
    pub async fn is_empty(&self, user_id: &str) -> bool {
        self.len(user_id).await == 0
    }

    async fn persist(&self, transcripts: &HashMap<String, Vec<Turn>>) {
        let json = match serde_json::to_string_pretty(transcripts) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "Failed to serialize transcripts");
                return;
            }
        };

        if let Err(err) = tokio::fs::write(&self.path, json).await {
            warn!(path = %self.path.display(), error = %err, "Failed to write transcripts");
        }
    }
}

fn load_map(path: &Path) -> HashMap<String, Vec<Turn>> {
    if !path.exists() {
        return HashMap::new();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(transcripts) => transcripts,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to parse transcripts, starting empty");
                HashMap::new()
            }
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to read transcripts, starting empty");
            HashMap::new()
        }
    }
}
