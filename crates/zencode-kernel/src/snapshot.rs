//! Per-language code snapshots.
//!
//! One snapshot per language, stored under `editor-code-<language>`. Loads
//! never fail: a missing entry or a storage error yields the language's
//! starter code.

use zencode_types::Language;

use crate::constants::SNAPSHOT_KEY_PREFIX;
use crate::store::SharedStore;

/// Storage key for a language's snapshot.
pub fn snapshot_key(language: Language) -> String {
    format!("{SNAPSHOT_KEY_PREFIX}{}", language.id())
}

/// Durable per-language code cache.
#[derive(Clone)]
pub struct SnapshotCache {
    store: SharedStore,
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("store", &self.store.name())
            .finish()
    }
}

impl SnapshotCache {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// The saved snapshot, or the starter code if there is none.
    pub async fn load(&self, language: Language) -> String {
        match self.store.get(&snapshot_key(language)).await {
            Ok(Some(code)) => code,
            Ok(None) => language.default_code().to_string(),
            Err(e) => {
                tracing::warn!(language = %language, error = %e, "snapshot load failed, using starter code");
                language.default_code().to_string()
            }
        }
    }

    /// Whether the user has a saved snapshot for `language`.
    pub async fn has_snapshot(&self, language: Language) -> bool {
        matches!(self.store.get(&snapshot_key(language)).await, Ok(Some(_)))
    }

    /// Overwrite the snapshot with the full current text.
    pub async fn save(&self, language: Language, code: &str) {
        if let Err(e) = self.store.set(&snapshot_key(language), code).await {
            tracing::warn!(language = %language, error = %e, "snapshot save failed");
        }
    }

    /// Forget the snapshot and return the starter code.
    pub async fn reset(&self, language: Language) -> String {
        if let Err(e) = self.store.remove(&snapshot_key(language)).await {
            tracing::warn!(language = %language, error = %e, "snapshot reset failed");
        }
        tracing::debug!(language = %language, "snapshot reset to starter code");
        language.default_code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn cache() -> SnapshotCache {
        SnapshotCache::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_key_format() {
        assert_eq!(snapshot_key(Language::Python), "editor-code-python");
        assert_eq!(snapshot_key(Language::Csharp), "editor-code-csharp");
    }

    #[tokio::test]
    async fn test_load_defaults_for_every_language() {
        let cache = cache();
        for lang in Language::all() {
            assert_eq!(cache.load(lang).await, lang.default_code());
            assert!(!cache.has_snapshot(lang).await);
        }
    }

    #[tokio::test]
    async fn test_read_after_write() {
        let cache = cache();
        for lang in Language::all() {
            let text = format!("// edited {lang}");
            cache.save(lang, &text).await;
            assert_eq!(cache.load(lang).await, text);
        }
    }

    #[tokio::test]
    async fn test_languages_are_independent() {
        let cache = cache();
        cache.save(Language::Go, "package main").await;
        assert_eq!(cache.load(Language::Rust).await, Language::Rust.default_code());
    }

    #[tokio::test]
    async fn test_reset_restores_default() {
        let cache = cache();
        cache.save(Language::Ruby, "puts 1").await;
        assert_eq!(cache.reset(Language::Ruby).await, Language::Ruby.default_code());
        assert_eq!(cache.load(Language::Ruby).await, Language::Ruby.default_code());
        assert!(!cache.has_snapshot(Language::Ruby).await);
    }

    #[tokio::test]
    async fn test_empty_text_is_a_snapshot() {
        let cache = cache();
        cache.save(Language::Swift, "").await;
        assert_eq!(cache.load(Language::Swift).await, "");
    }
}
