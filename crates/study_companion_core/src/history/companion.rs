//! crates/study_companion_core/src/history/companion.rs
//!
//! The single companion thread per user.

use crate::domain::ChatMessage;
use crate::history::MIN_MESSAGES_TO_SAVE;
use crate::ports::{PortError, PortResult};
use crate::store::RecordStore;

#[derive(Clone)]
pub struct CompanionHistory {
    store: RecordStore,
}

impl CompanionHistory {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Overwrites the stored thread. A single message is not worth keeping and
    /// leaves the stored thread as it was.
    pub async fn save(&self, messages: &[ChatMessage]) -> PortResult<()> {
        if messages.len() < MIN_MESSAGES_TO_SAVE {
            return Ok(());
        }

        let (mut users, username, mut record) = self
            .store
            .load_current()
            .await
            .ok_or(PortError::NotAuthenticated)?;
        record.companion_history = Some(messages.to_vec());

        users.insert(username, record);
        self.store.save_all(&users).await
    }

    pub async fn load(&self) -> Vec<ChatMessage> {
        self.store
            .load_current()
            .await
            .and_then(|(_, _, record)| record.companion_history)
            .unwrap_or_default()
    }
}
