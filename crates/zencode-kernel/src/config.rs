//! Workspace configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/zencode/config.toml`. Every section and
//! every field is optional; a missing file yields the defaults.
//!
//! ```toml
//! [storage]
//! path = "~/.local/share/zencode/storage.json"
//!
//! [assist]
//! provider_type = "gemini"
//! model = "gemini-1.5-flash"
//! api_key_env = "GEMINI_API_KEY"
//! timeout_secs = 60
//! sanitizer = "trusted"          # or "strip-scripts"
//!
//! [profile]
//! deployment_url_env = "CONVEX_URL"
//!
//! [billing]
//! checkout_url = "https://…"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assist::{AssistCoordinator, HtmlSanitizer, ScriptStripper, TrustedSource, priming_history};
use crate::constants::{
    CONFIG_FILE_REL, DEFAULT_ASSIST_TIMEOUT, DEFAULT_CHECKOUT_URL, DEFAULT_PROFILE_URL_ENV,
    STORAGE_FILE_REL,
};
use crate::identity::{ConvexProfileService, IdentityResolver};
use crate::llm::{
    ChatSession, GeminiProvider, GenerationConfig, LlmProvider, ProviderConfig, SafetySetting,
};
use crate::store::{FallbackStore, FileStore, MemoryStore, SharedStore};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unsupported provider type: {0}")]
    UnknownProvider(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZencodeConfig {
    pub storage: StorageConfig,
    pub assist: AssistConfig,
    pub profile: ProfileConfig,
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage file; `~` is expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    #[serde(flatten)]
    pub provider: ProviderConfig,
    /// Bounded wait per request. `0` disables the bound.
    pub timeout_secs: u64,
    pub sanitizer: SanitizerKind,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            timeout_secs: DEFAULT_ASSIST_TIMEOUT.as_secs(),
            sanitizer: SanitizerKind::default(),
        }
    }
}

impl AssistConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Which [`HtmlSanitizer`] sits between the model and the panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SanitizerKind {
    #[default]
    Trusted,
    StripScripts,
}

impl SanitizerKind {
    pub fn build(self) -> Arc<dyn HtmlSanitizer> {
        match self {
            SanitizerKind::Trusted => Arc::new(TrustedSource),
            SanitizerKind::StripScripts => Arc::new(ScriptStripper::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_url: Option<String>,
    pub deployment_url_env: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            deployment_url: None,
            deployment_url_env: DEFAULT_PROFILE_URL_ENV.to_string(),
        }
    }
}

impl ProfileConfig {
    /// Inline URL, then the named environment variable.
    pub fn resolve_deployment_url(&self) -> Option<String> {
        self.deployment_url
            .clone()
            .or_else(|| std::env::var(&self.deployment_url_env).ok())
            .filter(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub checkout_url: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            checkout_url: DEFAULT_CHECKOUT_URL.to_string(),
        }
    }
}

impl ZencodeConfig {
    /// `$XDG_CONFIG_HOME/zencode/config.toml`, if a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_FILE_REL))
    }

    pub fn from_toml_str(text: &str, path: &Path) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`. A missing file yields the defaults.
    pub async fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                let config = Self::from_toml_str(&text, path)?;
                tracing::debug!(path = %path.display(), "loaded config");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load from [`default_path`](Self::default_path), or use the defaults.
    pub async fn load_default() -> ConfigResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load(path).await,
            None => Ok(Self::default()),
        }
    }

    /// Resolved storage file location.
    pub fn storage_path(&self) -> PathBuf {
        match &self.storage.path {
            Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(STORAGE_FILE_REL),
        }
    }

    /// Open durable storage, degrading to memory if the file can't be used.
    pub async fn open_store(&self) -> SharedStore {
        let path = self.storage_path();
        match FileStore::open(&path).await {
            Ok(file) => Arc::new(FallbackStore::new(Arc::new(file))),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "storage unavailable, keeping state in memory");
                Arc::new(MemoryStore::new())
            }
        }
    }

    pub fn build_provider(&self) -> ConfigResult<Arc<dyn LlmProvider>> {
        let provider = &self.assist.provider;
        match provider.provider_type.as_str() {
            "gemini" => Ok(Arc::new(GeminiProvider::from_config(provider))),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }

    /// Chat session primed for assist requests.
    pub fn build_chat(&self) -> ConfigResult<ChatSession> {
        let provider = self.build_provider()?;
        Ok(ChatSession::new(provider, priming_history())
            .with_model(self.assist.provider.model())
            .with_generation(GenerationConfig::assist())
            .with_safety(SafetySetting::assist_defaults()))
    }

    pub fn build_coordinator(&self) -> ConfigResult<AssistCoordinator> {
        let mut coordinator = AssistCoordinator::new(Arc::new(self.build_chat()?))
            .with_sanitizer(self.assist.sanitizer.build());
        if let Some(timeout) = self.assist.timeout() {
            coordinator = coordinator.with_timeout(timeout);
        }
        Ok(coordinator)
    }

    /// Profile resolver; offline when no deployment URL is configured.
    pub fn build_resolver(&self) -> IdentityResolver {
        match self.profile.resolve_deployment_url() {
            Some(url) => IdentityResolver::new(Arc::new(ConvexProfileService::new(url))),
            None => {
                tracing::info!(
                    env = %self.profile.deployment_url_env,
                    "no profile deployment configured, subscription features disabled"
                );
                IdentityResolver::offline()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KvStore;

    #[test]
    fn test_empty_is_default() {
        let config = ZencodeConfig::from_toml_str("", Path::new("config.toml")).unwrap();
        assert_eq!(config, ZencodeConfig::default());
        assert_eq!(config.assist.timeout(), Some(DEFAULT_ASSIST_TIMEOUT));
        assert_eq!(config.billing.checkout_url, DEFAULT_CHECKOUT_URL);
        assert_eq!(config.profile.deployment_url_env, "CONVEX_URL");
    }

    #[test]
    fn test_full_config() {
        let text = r#"
            [storage]
            path = "/tmp/zencode.json"

            [assist]
            provider_type = "gemini"
            model = "gemini-1.5-pro"
            api_key = "k"
            base_url = "http://localhost:9999"
            timeout_secs = 5
            sanitizer = "strip-scripts"

            [profile]
            deployment_url = "https://otter.convex.cloud"

            [billing]
            checkout_url = "https://example.com/buy"
        "#;
        let config = ZencodeConfig::from_toml_str(text, Path::new("config.toml")).unwrap();
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/zencode.json"));
        assert_eq!(config.assist.provider.model(), "gemini-1.5-pro");
        assert_eq!(config.assist.provider.endpoint(), "http://localhost:9999");
        assert_eq!(config.assist.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.assist.sanitizer, SanitizerKind::StripScripts);
        assert_eq!(
            config.profile.resolve_deployment_url().as_deref(),
            Some("https://otter.convex.cloud")
        );
        assert_eq!(config.billing.checkout_url, "https://example.com/buy");
    }

    #[test]
    fn test_zero_timeout_disables_bound() {
        let config =
            ZencodeConfig::from_toml_str("[assist]\ntimeout_secs = 0\n", Path::new("c.toml")).unwrap();
        assert_eq!(config.assist.timeout(), None);
    }

    #[test]
    fn test_parse_error_names_path() {
        let err = ZencodeConfig::from_toml_str("[assist\n", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_unknown_provider() {
        let mut config = ZencodeConfig::default();
        config.assist.provider.provider_type = "openai".into();
        assert!(matches!(
            config.build_provider(),
            Err(ConfigError::UnknownProvider(p)) if p == "openai"
        ));
    }

    #[test]
    fn test_sanitizer_kinds() {
        assert_eq!(SanitizerKind::Trusted.build().name(), "trusted");
        assert_eq!(SanitizerKind::StripScripts.build().name(), "strip-scripts");
    }

    #[test]
    fn test_build_chat_is_primed() {
        let config = ZencodeConfig::default();
        let chat = config.build_chat().unwrap();
        assert_eq!(chat.history(), priming_history());
        assert_eq!(chat.model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_unset_env_means_offline() {
        let mut config = ZencodeConfig::default();
        config.profile.deployment_url_env = "ZENCODE_TEST_UNSET_CONVEX_URL".into();
        assert_eq!(config.profile.resolve_deployment_url(), None);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ZencodeConfig::load(dir.path().join("nope.toml")).await.unwrap();
        assert_eq!(config, ZencodeConfig::default());
    }

    #[tokio::test]
    async fn test_open_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ZencodeConfig::default();
        config.storage.path = Some(dir.path().join("s.json").display().to_string());

        let store = config.open_store().await;
        store.set("editor-font-size", "18").await.unwrap();

        let reopened = config.open_store().await;
        assert_eq!(
            reopened.get("editor-font-size").await.unwrap().as_deref(),
            Some("18")
        );
    }

    #[tokio::test]
    async fn test_open_store_degrades_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        std::fs::write(&path, "not json").unwrap();
        let mut config = ZencodeConfig::default();
        config.storage.path = Some(path.display().to_string());

        let store = config.open_store().await;
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
