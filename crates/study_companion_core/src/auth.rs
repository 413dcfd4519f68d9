//! crates/study_companion_core/src/auth.rs
//!
//! Sign-up, login and logout on top of the record store.

use tracing::info;

use crate::hash::password_digest;
use crate::ports::{PortError, PortResult};
use crate::records::UserRecord;
use crate::store::{RecordStore, USERS_DB_KEY};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct Auth {
    store: RecordStore,
}

impl Auth {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Creates a user, persists it and makes it the current session.
    pub async fn sign_up(&self, username: &str, password: &str) -> PortResult<String> {
        let mut users = self.store.load_all().await;
        if users.contains_key(username) {
            return Err(PortError::DuplicateUser);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PortError::WeakPassword);
        }

        users.insert(
            username.to_string(),
            UserRecord::new(password_digest(password)),
        );
        self.store.save_all(&users).await?;
        self.store.set_current_user(username).await?;

        info!("Created user '{}'", username);
        Ok(username.to_string())
    }

    /// Checks credentials and makes the user the current session.
    ///
    /// An unknown username and a wrong password fail identically.
    pub async fn login(&self, username: &str, password: &str) -> PortResult<String> {
        let users = self.store.load_all().await;
        let matches = users
            .get(username)
            .is_some_and(|record| record.password_hash == password_digest(password));
        if !matches {
            return Err(PortError::InvalidCredentials);
        }

        self.store.set_current_user(username).await?;
        Ok(username.to_string())
    }

    /// Clears every piece of client-held state while keeping the user mapping.
    ///
    /// The persistent area is cleared wholesale, so the mapping is snapshotted
    /// first and written back afterwards.
    ///
    /// When the persistent area is shared by several clients, they all see it
    /// empty between the clear and the rewrite: a login there fails with
    /// `InvalidCredentials`, and a sign-up saved there is overwritten by the
    /// snapshot. This is the same last-write-wins race as any other
    /// read-modify-write of the mapping.
    pub async fn logout(&self) -> PortResult<()> {
        let snapshot = self.store.persistent().get(USERS_DB_KEY).await?;
        self.store.persistent().clear().await?;
        if let Some(raw) = snapshot {
            self.store.persistent().set(USERS_DB_KEY, &raw).await?;
        }
        self.store.volatile().clear().await?;
        Ok(())
    }

    pub async fn current_user(&self) -> Option<String> {
        self.store.current_user().await
    }
}
