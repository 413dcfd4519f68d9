//! crates/study_companion_core/src/store.rs
//!
//! The record store: the only component that reads or writes the serialized
//! user mapping and the session pointer.
//!
//! Every caller loads the whole mapping, mutates it in memory and writes it
//! back. There is no locking, so two writers racing on the same slot end with
//! the last write winning.

use std::sync::Arc;
use tracing::warn;

use crate::ports::{KeyValueStore, PortError, PortResult};
use crate::records::{UserMap, UserRecord};

/// Persistent slot holding the JSON user mapping.
pub const USERS_DB_KEY: &str = "users-db";
/// Volatile slot holding the current username.
pub const SESSION_KEY: &str = "session";

#[derive(Clone)]
pub struct RecordStore {
    persistent: Arc<dyn KeyValueStore>,
    volatile: Arc<dyn KeyValueStore>,
}

impl RecordStore {
    pub fn new(persistent: Arc<dyn KeyValueStore>, volatile: Arc<dyn KeyValueStore>) -> Self {
        Self {
            persistent,
            volatile,
        }
    }

    /// Reads the user mapping. A missing slot or one that is not a JSON object
    /// yields an empty mapping; single entries that do not decode are carried
    /// along as raw JSON (see `UserMap`).
    pub async fn load_all(&self) -> UserMap {
        let raw = match self.persistent.get(USERS_DB_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return UserMap::new(),
            Err(e) => {
                warn!("Failed to read {}: {}", USERS_DB_KEY, e);
                return UserMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring unparsable {}: {}", USERS_DB_KEY, e);
            UserMap::new()
        })
    }

    /// Overwrites the user mapping with a single write.
    pub async fn save_all(&self, users: &UserMap) -> PortResult<()> {
        let raw = serde_json::to_string(users).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.persistent.set(USERS_DB_KEY, &raw).await
    }

    pub async fn current_user(&self) -> Option<String> {
        match self.volatile.get(SESSION_KEY).await {
            Ok(user) => user.filter(|u| !u.is_empty()),
            Err(e) => {
                warn!("Failed to read {}: {}", SESSION_KEY, e);
                None
            }
        }
    }

    pub async fn set_current_user(&self, username: &str) -> PortResult<()> {
        self.volatile.set(SESSION_KEY, username).await
    }

    pub async fn clear_session(&self) -> PortResult<()> {
        self.volatile.remove(SESSION_KEY).await
    }

    /// Loads the mapping together with the current user's name and record, if
    /// both exist.
    pub async fn load_current(&self) -> Option<(UserMap, String, UserRecord)> {
        let username = self.current_user().await?;
        let users = self.load_all().await;
        let record = users.get(&username)?.clone();
        Some((users, username, record))
    }

    pub(crate) fn persistent(&self) -> &Arc<dyn KeyValueStore> {
        &self.persistent
    }

    pub(crate) fn volatile(&self) -> &Arc<dyn KeyValueStore> {
        &self.volatile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn store() -> (Arc<MemoryStore>, Arc<MemoryStore>, RecordStore) {
        let persistent = Arc::new(MemoryStore::new());
        let volatile = Arc::new(MemoryStore::new());
        let store = RecordStore::new(persistent.clone(), volatile.clone());
        (persistent, volatile, store)
    }

    #[tokio::test]
    async fn load_all_is_empty_when_slot_absent() {
        let (_, _, store) = store();
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn load_all_fails_open_on_garbage() {
        let (persistent, _, store) = store();
        persistent.set(USERS_DB_KEY, "{not json").await.unwrap();
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn save_all_then_load_all_returns_mapping() {
        let (_, _, store) = store();
        let mut users = UserMap::new();
        users.insert("bob".to_string(), UserRecord::new("digest".to_string()));
        store.save_all(&users).await.unwrap();
        assert_eq!(store.load_all().await, users);
    }

    #[tokio::test]
    async fn session_pointer_set_and_clear() {
        let (_, volatile, store) = store();
        assert_eq!(store.current_user().await, None);
        store.set_current_user("bob").await.unwrap();
        assert_eq!(store.current_user().await.as_deref(), Some("bob"));
        store.clear_session().await.unwrap();
        assert_eq!(store.current_user().await, None);
        assert!(volatile.is_empty());
    }
}
