//! LLM provider abstraction for the assist workflow.
//!
//! This module provides a provider-neutral request/response model, the
//! [`LlmProvider`] trait, a Gemini implementation over HTTP, and a
//! [`ChatSession`] that carries conversation history between requests.

mod chat;
mod config;
mod gemini;

pub use chat::ChatSession;
pub use config::ProviderConfig;
pub use gemini::GeminiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Human/user message.
    User,
    /// Model message.
    Assistant,
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: Role,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Input tokens consumed.
    pub input_tokens: u32,
    /// Output tokens generated.
    pub output_tokens: u32,
}

/// Response from an LLM completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text content.
    pub content: String,
    /// Model that generated the response.
    pub model: String,
    /// Reason the generation stopped.
    pub stop_reason: Option<String>,
    /// Token usage statistics.
    pub usage: Usage,
}

/// Sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_output_tokens: u32,
    /// MIME type the model should answer in.
    pub response_mime_type: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: None,
            top_p: None,
            top_k: None,
            max_output_tokens: 4096,
            response_mime_type: None,
        }
    }
}

impl GenerationConfig {
    /// Sampling used for code assistance: creative, plain-text answers.
    pub fn assist() -> Self {
        Self {
            temperature: Some(1.0),
            top_p: Some(0.85),
            top_k: Some(40),
            max_output_tokens: 8192,
            response_mime_type: Some("text/plain".into()),
        }
    }
}

/// Content category a safety filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
}

/// Probability at which a safety filter starts blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockLowAndAbove,
}

/// One safety filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// Filters used for code assistance.
    pub fn assist_defaults() -> Vec<SafetySetting> {
        vec![
            SafetySetting {
                category: HarmCategory::Harassment,
                threshold: HarmBlockThreshold::BlockLowAndAbove,
            },
            SafetySetting {
                category: HarmCategory::HateSpeech,
                threshold: HarmBlockThreshold::BlockLowAndAbove,
            },
        ]
    }
}

/// Configuration for a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Conversation history, ending with the new user turn.
    pub messages: Vec<Message>,
    /// Model identifier.
    pub model: String,
    /// Sampling parameters.
    pub generation: GenerationConfig,
    /// Safety filters.
    pub safety: Vec<SafetySetting>,
}

impl CompletionRequest {
    /// Create a new completion request.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            messages,
            model: model.into(),
            generation: GenerationConfig::default(),
            safety: Vec::new(),
        }
    }

    /// Set sampling parameters.
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Set safety filters.
    pub fn with_safety(mut self, safety: Vec<SafetySetting>) -> Self {
        self.safety = safety;
        self
    }
}

/// Error type for LLM operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Provider not configured or unavailable.
    #[error("provider not available: {0}")]
    Unavailable(String),

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// Rate limited.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Invalid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Model refused to answer (safety block, recitation, ...).
    #[error("response blocked: {0}")]
    Blocked(String),

    /// API error.
    #[error("api error: {0}")]
    ApiError(String),

    /// Network error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Trait for LLM providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model used when a request does not name one.
    fn default_model(&self) -> &str;

    /// Check if the provider is ready (has credentials, connection, etc.).
    async fn is_available(&self) -> bool;

    /// Send a completion request.
    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let user = Message::user("hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "hello");

        let assistant = Message::assistant("hi there");
        assert_eq!(assistant.role, Role::Assistant);
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new("gemini-1.5-flash", vec![Message::user("test")])
            .with_generation(GenerationConfig::assist())
            .with_safety(SafetySetting::assist_defaults());

        assert_eq!(request.model, "gemini-1.5-flash");
        assert_eq!(request.generation, GenerationConfig::assist());
        assert_eq!(request.safety.len(), 2);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_assist_generation_config() {
        let config = GenerationConfig::assist();
        assert_eq!(config.top_k, Some(40));
        assert_eq!(config.max_output_tokens, 8192);
        assert_eq!(config.response_mime_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_safety_wire_names() {
        let json = serde_json::to_value(SafetySetting::assist_defaults()).unwrap();
        assert_eq!(json[0]["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(json[1]["category"], "HARM_CATEGORY_HATE_SPEECH");
        assert_eq!(json[0]["threshold"], "BLOCK_LOW_AND_ABOVE");
    }
}
