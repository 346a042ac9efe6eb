//! JSON-file key-value backend.
//!
//! The whole store is one JSON object (`{"key": "value", ...}`). Reads are
//! served from an in-memory mirror loaded at open; every write updates the
//! mirror first and then rewrites the file through a temp file + rename, so
//! a crash never leaves a half-written store behind.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::Instrument;

use super::{KvStore, StoreError, StoreResult};

/// File-backed store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
    /// Serializes flushes so the last write always lands last.
    flush_lock: Mutex<()>,
    read_only: bool,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store. An unreadable or malformed file is an
    /// error: the caller decides whether to degrade.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path: PathBuf = path.into();
        let entries = match fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => serde_json::from_str::<HashMap<String, String>>(&raw)
                .map_err(|e| StoreError::corrupt(path.display().to_string(), e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            flush_lock: Mutex::new(()),
            read_only: false,
        })
    }

    /// Refuse all writes from now on.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "store".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn flush(&self) -> StoreResult<()> {
        let _guard = self.flush_lock.lock().await;

        // Serialize inside the lock so we always write the newest mirror.
        let raw = {
            let entries = self.entries.read();
            serde_json::to_string_pretty(&*entries)
                .map_err(|e| StoreError::other(format!("serialize store: {e}")))?
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, raw).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        self.flush()
            .instrument(tracing::debug_span!("store.flush", op = "set", key))
            .await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        let existed = self.entries.write().remove(key).is_some();
        if existed {
            self.flush()
                .instrument(tracing::debug_span!("store.flush", op = "remove", key))
                .await?;
        }
        Ok(())
    }
}
