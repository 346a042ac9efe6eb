//! Degrading store wrapper.
//!
//! Wraps a durable store and mirrors every value in memory. The first time
//! the durable side fails, the wrapper logs once and serves the rest of the
//! session from the mirror. Callers never see a storage error.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{KvStore, MemoryStore, SharedStore, StoreError, StoreResult};

/// Durable store with an in-memory safety net.
pub struct FallbackStore {
    primary: SharedStore,
    mirror: MemoryStore,
    degraded: AtomicBool,
}

impl std::fmt::Debug for FallbackStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackStore")
            .field("primary", &self.primary.name())
            .field("degraded", &self.is_degraded())
            .finish()
    }
}

impl FallbackStore {
    pub fn new(primary: SharedStore) -> Self {
        Self {
            primary,
            mirror: MemoryStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Whether the durable side has been abandoned for this session.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    fn degrade(&self, op: &str, key: &str, error: &StoreError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(
                backend = self.primary.name(),
                op,
                key,
                error = %error,
                "durable storage unavailable, keeping state in memory for this session"
            );
        }
    }
}

#[async_trait]
impl KvStore for FallbackStore {
    fn name(&self) -> &str {
        if self.is_degraded() {
            "memory"
        } else {
            self.primary.name()
        }
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if self.is_degraded() {
            return Ok(self.mirror.get_sync(key));
        }
        match self.primary.get(key).await {
            Ok(value) => {
                match &value {
                    Some(v) => self.mirror.set_sync(key, v),
                    None => self.mirror.remove_sync(key),
                }
                Ok(value)
            }
            Err(e) => {
                self.degrade("get", key, &e);
                Ok(self.mirror.get_sync(key))
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.mirror.set_sync(key, value);
        if !self.is_degraded()
            && let Err(e) = self.primary.set(key, value).await
        {
            self.degrade("set", key, &e);
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.mirror.remove_sync(key);
        if !self.is_degraded()
            && let Err(e) = self.primary.remove(key).await
        {
            self.degrade("remove", key, &e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FileStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_passes_through_when_healthy() {
        let primary = Arc::new(MemoryStore::new());
        let store = FallbackStore::new(primary.clone());
        store.set("k", "v").await.unwrap();
        assert_eq!(primary.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(!store.is_degraded());
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn test_degrades_on_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = FileStore::open(dir.path().join("s.json")).await.unwrap();
        file.set_read_only(true);
        let store = FallbackStore::new(Arc::new(file));

        store.set("editor-code-rust", "fn main() {}").await.unwrap();
        assert!(store.is_degraded());
        assert_eq!(
            store.get("editor-code-rust").await.unwrap().as_deref(),
            Some("fn main() {}")
        );

        store.remove("editor-code-rust").await.unwrap();
        assert_eq!(store.get("editor-code-rust").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_read_before_degrading_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        {
            let seed = FileStore::open(&path).await.unwrap();
            seed.set("editor-font-size", "20").await.unwrap();
        }
        let mut file = FileStore::open(&path).await.unwrap();
        file.set_read_only(true);
        let store = FallbackStore::new(Arc::new(file));

        assert_eq!(store.get("editor-font-size").await.unwrap().as_deref(), Some("20"));
        store.set("other", "x").await.unwrap();
        assert!(store.is_degraded());
        assert_eq!(store.get("editor-font-size").await.unwrap().as_deref(), Some("20"));
    }
}
