//! services/api/src/adapters/storage.rs
//!
//! A file-backed implementation of the `KeyValueStore` port. Each key is one
//! file in the data directory; this is the persistent area holding `users-db`.

use async_trait::async_trait;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use study_companion_core::ports::{KeyValueStore, PortError, PortResult};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

const SLOT_EXT: &str = "slot";

fn key_regex() -> &'static Regex {
    static KEY: OnceLock<Regex> = OnceLock::new();
    KEY.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("key pattern is valid"))
}

/// Writers (`set`, `remove`, `clear`) take `write_lock`, so each one lands
/// whole before the next starts. Readers never wait.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl AsRef<Path>) -> PortResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PortError::Storage(format!("create {}: {}", dir.display(), e)))?;
        Ok(Self {
            dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn slot_path(&self, key: &str) -> PortResult<PathBuf> {
        if !key_regex().is_match(key) {
            return Err(PortError::Storage(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.{}", key, SLOT_EXT)))
    }
}

fn storage_error(action: &str, path: &Path, e: std::io::Error) -> PortError {
    PortError::Storage(format!("{} {}: {}", action, path.display(), e))
}

async fn discard_tmp(tmp: &Path) {
    if let Err(e) = tokio::fs::remove_file(tmp).await {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", tmp.display(), e);
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.slot_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", &path, e)),
        }
    }

    /// Writes to a uniquely named temporary file and renames it over the slot,
    /// so readers see either the old or the new value.
    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let path = self.slot_path(key)?;
        let tmp = self
            .dir
            .join(format!("{}.{}.{}.tmp", key, SLOT_EXT, Uuid::new_v4()));

        let _guard = self.write_lock.lock().await;
        if let Err(e) = tokio::fs::write(&tmp, value).await {
            discard_tmp(&tmp).await;
            return Err(storage_error("write", &tmp, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            discard_tmp(&tmp).await;
            return Err(storage_error("rename", &path, e));
        }
        debug!("Wrote {} bytes to '{}'", value.len(), key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let path = self.slot_path(key)?;
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", &path, e)),
        }
    }

    async fn clear(&self) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| storage_error("list", &self.dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage_error("list", &self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(SLOT_EXT) {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| storage_error("remove", &path, e))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get("users-db").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_get_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        store.set("users-db", "{\"a\":1}").await.unwrap();
        assert_eq!(
            store.get("users-db").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        store.set("users-db", "{}").await.unwrap();
        assert_eq!(store.get("users-db").await.unwrap().as_deref(), Some("{}"));

        store.remove("users-db").await.unwrap();
        store.remove("users-db").await.unwrap();
        assert_eq!(store.get("users-db").await.unwrap(), None);
    }

    #[tokio::test]
    async fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::open(dir.path())
            .await
            .unwrap()
            .set("users-db", "persisted")
            .await
            .unwrap();

        let reopened = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(
            reopened.get("users-db").await.unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[tokio::test]
    async fn clear_removes_only_slots() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.set("users-db", "{}").await.unwrap();
        store.set("theme", "dark").await.unwrap();
        std::fs::write(dir.path().join("README.txt"), "keep me").unwrap();

        store.clear().await.unwrap();

        assert_eq!(store.get("users-db").await.unwrap(), None);
        assert_eq!(store.get("theme").await.unwrap(), None);
        assert!(dir.path().join("README.txt").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_never_tear_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let values: Vec<String> = (0..8)
            .map(|i| serde_json::json!({ "writer": i, "pad": "x".repeat(i * 512) }).to_string())
            .collect();

        for _ in 0..20 {
            let mut writers = Vec::new();
            for value in values.clone() {
                let store = store.clone();
                writers.push(tokio::spawn(async move { store.set("users-db", &value).await }));
            }
            let reader = {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut seen = Vec::new();
                    for _ in 0..10 {
                        if let Some(raw) = store.get("users-db").await.unwrap() {
                            seen.push(raw);
                        }
                        tokio::task::yield_now().await;
                    }
                    seen
                })
            };

            for writer in writers {
                writer.await.unwrap().unwrap();
            }
            for raw in reader.await.unwrap() {
                assert!(values.contains(&raw), "torn read: {} bytes", raw.len());
            }
        }

        let last = store.get("users-db").await.unwrap().unwrap();
        assert!(values.contains(&last));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn rejects_keys_that_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let err = store.set("../evil", "x").await.unwrap_err();
        assert!(matches!(err, PortError::Storage(_)));
    }
}
