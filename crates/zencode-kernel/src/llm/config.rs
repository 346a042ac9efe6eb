//! LLM provider configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_GEMINI_BASE_URL, DEFAULT_MODEL};

/// Configuration for an LLM provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type identifier (currently only "gemini").
    #[serde(default = "default_provider_type")]
    pub provider_type: String,

    /// API key (for cloud providers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name for API key (alternative to inline key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Base URL override (for proxies or test servers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Default model for this provider.
    #[serde(default, alias = "model", skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

fn default_provider_type() -> String {
    "gemini".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new(default_provider_type())
    }
}

impl ProviderConfig {
    /// Create a new provider config.
    pub fn new(provider_type: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            api_key: None,
            api_key_env: None,
            base_url: None,
            default_model: None,
        }
    }

    /// Set API key directly.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set API key from environment variable name.
    pub fn with_api_key_env(mut self, env_var: impl Into<String>) -> Self {
        self.api_key_env = Some(env_var.into());
        self
    }

    /// Set base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set default model.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Model to use, falling back to the built-in default.
    pub fn model(&self) -> &str {
        self.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Endpoint to use, falling back to the public API.
    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_BASE_URL)
            .trim_end_matches('/')
    }

    /// Resolve API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        // Direct key takes precedence
        if let Some(key) = &self.api_key {
            return Some(key.clone());
        }

        if let Some(env_var) = &self.api_key_env {
            return std::env::var(env_var).ok().filter(|k| !k.is_empty());
        }

        let standard_env = match self.provider_type.as_str() {
            "gemini" => "GEMINI_API_KEY",
            _ => return None,
        };
        std::env::var(standard_env).ok().filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_resolve_key() {
        // SAFETY: Single-threaded test, no other code is reading this env var concurrently
        unsafe {
            std::env::set_var("ZENCODE_TEST_API_KEY", "test-key-from-env");
        }

        let config = ProviderConfig::new("gemini").with_api_key_env("ZENCODE_TEST_API_KEY");
        assert_eq!(config.resolve_api_key(), Some("test-key-from-env".into()));

        // Direct key takes precedence
        let config = config.with_api_key("direct-key");
        assert_eq!(config.resolve_api_key(), Some("direct-key".into()));

        // SAFETY: Single-threaded test cleanup
        unsafe {
            std::env::remove_var("ZENCODE_TEST_API_KEY");
        }
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.provider_type, "gemini");
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.endpoint(), DEFAULT_GEMINI_BASE_URL);
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = ProviderConfig::default().with_base_url("http://localhost:8080/");
        assert_eq!(config.endpoint(), "http://localhost:8080");
    }

    #[test]
    fn test_unknown_provider_has_no_standard_env() {
        let config = ProviderConfig::new("mystery");
        assert_eq!(config.resolve_api_key(), None);
    }
}
