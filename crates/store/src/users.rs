//! User store: email-keyed flat-file CRUD.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::User;

/// Flat-file store of users keyed by email.
///
/// The whole map lives in memory; every mutation rewrites the backing file
/// in full (pretty-printed JSON). Write failures are logged and swallowed.
#[derive(Debug)]
pub struct UserStore {
    path: PathBuf,
    users: RwLock<HashMap<String, User>>,
}

impl UserStore {
    /// Load the store from `path`. A missing or unreadable file yields an
    /// empty store with a warning rather than an error.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let users = load_map(&path);
        Self {
            path,
            users: RwLock::new(users),
        }
    }

    /// Look up a user by email.
    pub async fn find(&self, email: &str) -> Option<User> {
        let users = self.users.read().await;
        users.get(email).cloned()
    }

    /// Look up a user by id.
    pub async fn find_by_id(&self, id: &str) -> Option<User> {
        let users = self.users.read().await;
        users.values().find(|user| user.id == id).cloned()
    }

    /// Create a new user. Fails with [`StoreError::EmailTaken`] when the
    /// email is already registered.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: Option<String>,
        google_user: bool,
    ) -> Result<User> {
        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Err(StoreError::EmailTaken(email.to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            phone: None,
            created_at: Utc::now().to_rfc3339(),
            google_user,
        };

        users.insert(email.to_string(), user.clone());
        self.persist(&users).await;
        Ok(user)
    }

    /// Update an existing user, re-keying the map when the email changed.
    /// Fails with [`StoreError::EmailTaken`] when the new email belongs to
    /// a different account, and [`StoreError::NotFound`] when the id is
    /// unknown.
    pub async fn update(&self, updated: User) -> Result<User> {
        let mut users = self.users.write().await;

        let old_email = users
            .values()
            .find(|user| user.id == updated.id)
            .map(|user| user.email.clone())
            .ok_or_else(|| StoreError::NotFound {
                entity: "User",
                id: updated.id.clone(),
            })?;

        if updated.email != old_email && users.contains_key(&updated.email) {
            return Err(StoreError::EmailTaken(updated.email));
        }

        if updated.email != old_email {
            users.remove(&old_email);
        }
        users.insert(updated.email.clone(), updated.clone());
        self.persist(&users).await;
        Ok(updated)
    }

    /// Number of registered users.
    pub async fn count(&self) -> usize {
        let users = self.users.read().await;
        users.len()
    }

    async fn persist(&self, users: &HashMap<String, User>) {
        write_map(&self.path, users).await;
    }
}

fn load_map(path: &Path) -> HashMap<String, User> {
    if !path.exists() {
        return HashMap::new();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(users) => users,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to parse user store, starting empty");
                HashMap::new()
            }
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to read user store, starting empty");
            HashMap::new()
        }
    }
}

async fn write_map(path: &Path, users: &HashMap<String, User>) {
    let json = match serde_json::to_string_pretty(users) {
        Ok(json) => json,
        Err(err) => {
            warn!(error = %err, "Failed to serialize user store");
            return;
        }
    };

    if let Err(err) = tokio::fs::write(path, json).await {
        warn!(path = %path.display(), error = %err, "Failed to write user store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> UserStore {
        UserStore::load(dir.path().join("users.json"))
    }

    #[tokio::test]
    async fn create_and_find() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let user = store
            .create("Ana", "ana@x.com", Some("hash".to_string()), false)
            .await
            .unwrap();

        assert_eq!(user.email, "ana@x.com");
        assert!(!user.id.is_empty());

        let found = store.find("ana@x.com").await.unwrap();
        assert_eq!(found.id, user.id);
        let by_id = store.find_by_id(&user.id).await.unwrap();
        assert_eq!(by_id.email, "ana@x.com");
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .create("Ana", "ana@x.com", Some("hash".to_string()), false)
            .await
            .unwrap();
        let err = store
            .create("Other", "ana@x.com", None, true)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::EmailTaken(email) if email == "ana@x.com"));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn distinct_users_get_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let a = store.create("A", "a@x.com", None, true).await.unwrap();
        let b = store.create("B", "b@x.com", None, true).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn update_rekeys_on_email_change() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut user = store
            .create("Ana", "ana@x.com", Some("hash".to_string()), false)
            .await
            .unwrap();

        user.email = "ana@y.com".to_string();
        user.phone = Some("555".to_string());
        store.update(user.clone()).await.unwrap();

        assert!(store.find("ana@x.com").await.is_none());
        let found = store.find("ana@y.com").await.unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.phone.as_deref(), Some("555"));
    }

    #[tokio::test]
    async fn update_rejects_taken_email() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.create("Ana", "ana@x.com", None, false).await.unwrap();
        let mut bob = store.create("Bob", "bob@x.com", None, false).await.unwrap();

        bob.email = "ana@x.com".to_string();
        let err = store.update(bob).await.unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken(_)));

        // Bob still reachable under his old email.
        assert!(store.find("bob@x.com").await.is_some());
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let ghost = User {
            id: "missing".to_string(),
            name: "Ghost".to_string(),
            email: "ghost@x.com".to_string(),
            password_hash: None,
            phone: None,
            created_at: Utc::now().to_rfc3339(),
            google_user: false,
        };
        let err = store.update(ghost).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn survives_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let created = {
            let store = UserStore::load(&path);
            store
                .create("Ana", "ana@x.com", Some("hash".to_string()), false)
                .await
                .unwrap()
        };

        let reloaded = UserStore::load(&path);
        let found = reloaded.find("ana@x.com").await.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.password_hash.as_deref(), Some("hash"));
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "not json").unwrap();

        let store = UserStore::load(&path);
        assert_eq!(store.count().await, 0);
    }
}
