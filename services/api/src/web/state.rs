//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-tab state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::{Duration, Instant};
use study_companion_core::{
    chat::Conversation,
    memory::MemoryStore,
    ports::{ChatService, KeyValueStore, SourceFormattingService, StudyPlanService},
    store::RecordStore,
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info};
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Tabs)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Persistent storage area holding the `users-db` slot.
    pub users_db: Arc<dyn KeyValueStore>,
    pub plan_adapter: Arc<dyn StudyPlanService>,
    pub chat_adapter: Arc<dyn ChatService>,
    pub format_adapter: Arc<dyn SourceFormattingService>,
    pub tabs: Arc<TabRegistry>,
}

impl AppState {
    /// The record store as seen from one tab.
    pub fn record_store(&self, tab: &TabState) -> RecordStore {
        RecordStore::new(self.users_db.clone(), tab.storage.clone())
    }
}

//=========================================================================================
// TabState (Specific to One Client)
//=========================================================================================

/// Which of the tab's two chat threads a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thread {
    Tutor,
    Companion,
}

/// Everything a single client holds outside the persistent area.
pub struct TabState {
    pub id: String,
    /// Volatile storage area holding the `session` slot.
    pub storage: Arc<MemoryStore>,
    pub tutor: Mutex<Option<Conversation>>,
    pub companion: Mutex<Option<Conversation>>,
}

impl TabState {
    pub fn new(id: String) -> Self {
        Self {
            id,
            storage: Arc::new(MemoryStore::new()),
            tutor: Mutex::new(None),
            companion: Mutex::new(None),
        }
    }

    pub fn thread(&self, thread: Thread) -> &Mutex<Option<Conversation>> {
        match thread {
            Thread::Tutor => &self.tutor,
            Thread::Companion => &self.companion,
        }
    }

    /// Drops the in-memory conversations.
    pub async fn reset_conversations(&self) {
        *self.tutor.lock().await = None;
        *self.companion.lock().await = None;
    }
}

/// Tabs idle for longer than this are dropped by `sweep_idle`.
pub const TAB_IDLE_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);
/// Upper bound on live tabs; creating one beyond it evicts the least recently seen.
pub const MAX_TABS: usize = 10_000;

struct TabEntry {
    tab: Arc<TabState>,
    last_seen: Instant,
}

/// All live tabs, keyed by the `tab` cookie value. Only ids minted by
/// `create` are ever stored.
pub struct TabRegistry {
    tabs: StdMutex<HashMap<String, TabEntry>>,
    idle_timeout: Duration,
    capacity: usize,
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::with_limits(TAB_IDLE_TIMEOUT, MAX_TABS)
    }
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_timeout: Duration, capacity: usize) -> Self {
        Self {
            tabs: StdMutex::new(HashMap::new()),
            idle_timeout,
            capacity: capacity.max(1),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, TabEntry>> {
        match self.tabs.lock() {
            Ok(tabs) => tabs,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns a live tab and marks it as seen. Unknown ids yield `None`.
    pub fn get(&self, id: &str) -> Option<Arc<TabState>> {
        let mut tabs = self.entries();
        let entry = tabs.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry.tab.clone())
    }

    /// Mints a new tab id and registers empty state for it.
    pub fn create(&self) -> Arc<TabState> {
        let id = Uuid::new_v4().to_string();
        let tab = Arc::new(TabState::new(id.clone()));

        let mut tabs = self.entries();
        if tabs.len() >= self.capacity {
            let oldest = tabs
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                debug!("Tab limit reached, evicting {}", oldest);
                tabs.remove(&oldest);
            }
        }
        tabs.insert(
            id,
            TabEntry {
                tab: tab.clone(),
                last_seen: Instant::now(),
            },
        );
        tab
    }

    pub fn remove(&self, id: &str) {
        self.entries().remove(id);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drops tabs not seen for the idle timeout. Returns how many were dropped.
    pub fn sweep_idle(&self) -> usize {
        self.sweep_idle_at(Instant::now())
    }

    pub fn sweep_idle_at(&self, now: Instant) -> usize {
        let mut tabs = self.entries();
        let before = tabs.len();
        tabs.retain(|_, entry| now.saturating_duration_since(entry.last_seen) < self.idle_timeout);
        before - tabs.len()
    }

    /// Runs `sweep_idle` every `every` on the current runtime.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let dropped = registry.sweep_idle();
                if dropped > 0 {
                    info!("Dropped {} idle tabs, {} remain", dropped, registry.len());
                }
            }
        })
    }
}
