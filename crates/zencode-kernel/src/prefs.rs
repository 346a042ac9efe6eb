//! Editor preferences: language, theme, font size.
//!
//! Values live in memory and are written through to storage on every
//! change. Nothing here can fail from the caller's point of view: bad input
//! is corrected and storage errors are logged.

use parking_lot::RwLock;

use zencode_types::{FontSize, Language, Theme};

use crate::constants::{FONT_SIZE_KEY, LANGUAGE_KEY, THEME_KEY};
use crate::store::SharedStore;

/// Plain copy of the current preferences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Preferences {
    pub language: Language,
    pub theme: Theme,
    pub font_size: FontSize,
}

/// Preference store with write-through persistence.
pub struct PreferenceStore {
    store: SharedStore,
    current: RwLock<Preferences>,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("store", &self.store.name())
            .field("current", &*self.current.read())
            .finish()
    }
}

impl PreferenceStore {
    /// Defaults, without reading storage.
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            current: RwLock::new(Preferences::default()),
        }
    }

    /// Read every persisted preference. Missing or unreadable values keep
    /// their defaults; out-of-range font sizes are clamped.
    pub async fn restore(store: SharedStore) -> Self {
        let mut prefs = Preferences::default();

        if let Some(raw) = read(&store, FONT_SIZE_KEY).await {
            match FontSize::parse_stored(&raw) {
                Some(size) => prefs.font_size = size,
                None => tracing::debug!(value = %raw, "ignoring unparsable stored font size"),
            }
        }
        if let Some(raw) = read(&store, THEME_KEY).await {
            match raw.parse::<Theme>() {
                Ok(theme) => prefs.theme = theme,
                Err(e) => tracing::debug!(error = %e, "ignoring stored theme"),
            }
        }
        if let Some(raw) = read(&store, LANGUAGE_KEY).await {
            match raw.parse::<Language>() {
                Ok(language) => prefs.language = language,
                Err(e) => tracing::debug!(error = %e, "ignoring stored language"),
            }
        }

        tracing::debug!(?prefs, "restored preferences");
        Self {
            store,
            current: RwLock::new(prefs),
        }
    }

    pub fn snapshot(&self) -> Preferences {
        *self.current.read()
    }

    pub fn font_size(&self) -> FontSize {
        self.current.read().font_size
    }

    /// Clamp, remember and persist a font size. Returns the clamped value.
    pub async fn set_font_size(&self, requested: i64) -> FontSize {
        let size = FontSize::clamped(requested);
        self.current.write().font_size = size;
        write(&self.store, FONT_SIZE_KEY, &size.to_string()).await;
        size
    }

    pub fn theme(&self) -> Theme {
        self.current.read().theme
    }

    pub async fn set_theme(&self, theme: Theme) {
        self.current.write().theme = theme;
        write(&self.store, THEME_KEY, theme.as_ref()).await;
    }

    pub fn language(&self) -> Language {
        self.current.read().language
    }

    pub async fn set_language(&self, language: Language) {
        self.switch_language(language);
        self.persist_language().await;
    }

    /// Change the in-memory language only.
    pub fn switch_language(&self, language: Language) {
        self.current.write().language = language;
    }

    /// Store whatever language is current at the time of the call.
    pub async fn persist_language(&self) {
        let language = self.language();
        write(&self.store, LANGUAGE_KEY, language.id()).await;
    }
}

async fn read(store: &SharedStore, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "preference read failed");
            None
        }
    }
}

async fn write(store: &SharedStore, key: &str, value: &str) {
    if let Err(e) = store.set(key, value).await {
        tracing::warn!(key, error = %e, "preference write failed");
    }
}
