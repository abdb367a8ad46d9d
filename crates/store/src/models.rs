//! Persisted record types.

use serde::{Deserialize, Serialize};

/// A registered user, keyed by email in the user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque unique id (uuid v4).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address, unique across the store.
    pub email: String,
    /// SHA-256 hex digest of the password. None for Google-only accounts.
    pub password_hash: Option<String>,
    /// Optional phone number from profile updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// True when the account was created through Google federated login.
    #[serde(default)]
    pub google_user: bool,
}

impl User {
    /// Whether this account can log in with a password.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One message in a conversation transcript.
///
/// Older transcript files stored the text as the first element of a `parts`
/// array alongside (or instead of) a `text` field. Deserialization accepts
/// both shapes and normalizes to `text`, so nothing downstream branches on
/// the record layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TurnRecord")]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create a model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Raw on-disk turn shape, tolerant of the legacy `parts` layout.
#[derive(Deserialize)]
struct TurnRecord {
    role: Role,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    parts: Option<Vec<String>>,
}

impl From<TurnRecord> for Turn {
    fn from(record: TurnRecord) -> Self {
        let text = record
            .text
            .filter(|text| !text.is_empty())
            .or_else(|| record.parts.and_then(|parts| parts.into_iter().next()))
            .unwrap_or_default();
        Self {
            role: record.role,
            text,
        }
    }
}
