//! crates/study_companion_core/src/history/tutor.rs
//!
//! Tutor sessions, one per (curriculum, subject).

use chrono::Utc;

use crate::domain::{ChatMessage, Curriculum, TutorSession};
use crate::history::MIN_MESSAGES_TO_SAVE;
use crate::ports::{PortError, PortResult};
use crate::store::RecordStore;

#[derive(Clone)]
pub struct TutorHistory {
    store: RecordStore,
}

impl TutorHistory {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Stores the conversation for the pair, replacing any earlier one.
    /// Does nothing for a conversation that has not really started.
    pub async fn save(
        &self,
        curriculum: Curriculum,
        subject: &str,
        messages: &[ChatMessage],
    ) -> PortResult<()> {
        if messages.len() < MIN_MESSAGES_TO_SAVE {
            return Ok(());
        }

        let (mut users, username, mut record) = self
            .store
            .load_current()
            .await
            .ok_or(PortError::NotAuthenticated)?;

        let session = TutorSession {
            curriculum,
            subject: subject.to_string(),
            last_updated: Utc::now(),
            messages: messages.to_vec(),
        };
        let sessions = record.tutor_sessions.get_or_insert_with(Vec::new);
        match sessions.iter_mut().find(|s| s.is_for(curriculum, subject)) {
            Some(existing) => *existing = session,
            None => sessions.push(session),
        }

        users.insert(username, record);
        self.store.save_all(&users).await
    }

    pub async fn sessions(&self) -> Vec<TutorSession> {
        self.store
            .load_current()
            .await
            .and_then(|(_, _, record)| record.tutor_sessions)
            .unwrap_or_default()
    }

    pub async fn session(&self, curriculum: Curriculum, subject: &str) -> Option<TutorSession> {
        self.sessions()
            .await
            .into_iter()
            .find(|s| s.is_for(curriculum, subject))
    }
}
