//! In-memory key-value backend.
//!
//! Used for tests and as the degrade target when durable storage is
//! unavailable. All data is lost when dropped.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{KvStore, StoreResult};

/// In-memory store.
///
/// Thread-safe via internal `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of every entry.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.read().clone()
    }

    pub(crate) fn get_sync(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub(crate) fn set_sync(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }

    pub(crate) fn remove_sync(&self, key: &str) {
        self.entries.write().remove(key);
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.get_sync(key))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.set_sync(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.remove_sync(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite() {
        let store = MemoryStore::new();
        store.set("a", "1").await.unwrap();
        store.set("a", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_absent_is_ok() {
        let store = MemoryStore::with_entries([("a", "1")]);
        store.remove("a").await.unwrap();
        store.remove("a").await.unwrap();
        assert!(store.is_empty());
    }
}
