//! Multi-turn chat session.
//!
//! A `ChatSession` owns the conversation history for one user session and
//! replays it on every request, so follow-up questions see earlier answers.
//! History only grows on success: a failed turn leaves no trace. Past the
//! turn limit the oldest exchanges are dropped; the seed always stays.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Instrument;

use crate::constants::MAX_CHAT_TURNS;

use super::{
    CompletionRequest, GenerationConfig, LlmError, LlmProvider, LlmResult, Message,
    SafetySetting,
};

/// Conversation with one provider.
pub struct ChatSession {
    provider: Arc<dyn LlmProvider>,
    model: String,
    generation: GenerationConfig,
    safety: Vec<SafetySetting>,
    max_turns: usize,
    /// History the session was started with; `reset` returns here.
    seed: Vec<Message>,
    history: Mutex<Vec<Message>>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("turns", &self.history.lock().len())
            .finish()
    }
}

impl ChatSession {
    /// Start a session on the provider's default model with the given seed
    /// history.
    pub fn new(provider: Arc<dyn LlmProvider>, seed: Vec<Message>) -> Self {
        let model = provider.default_model().to_string();
        Self {
            provider,
            model,
            generation: GenerationConfig::default(),
            safety: Vec::new(),
            max_turns: MAX_CHAT_TURNS,
            history: Mutex::new(seed.clone()),
            seed,
        }
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
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

    /// Cap the exchanges kept after the seed.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Copy of the current history.
    pub fn history(&self) -> Vec<Message> {
        self.history.lock().clone()
    }

    /// Drop everything said after the seed.
    pub fn reset(&self) {
        *self.history.lock() = self.seed.clone();
    }

    /// Send one user turn and return the model's text.
    pub async fn send_message(&self, text: &str) -> LlmResult<String> {
        let user = Message::user(text);
        let mut messages = self.history();
        messages.push(user.clone());

        let request = CompletionRequest::new(self.model.clone(), messages)
            .with_generation(self.generation.clone())
            .with_safety(self.safety.clone());

        let span = tracing::info_span!(
            "llm.send_message",
            provider = self.provider.name(),
            model = %self.model
        );
        let response = self.provider.complete(request).instrument(span).await?;
        if response.content.trim().is_empty() {
            return Err(LlmError::ApiError("model returned no text".into()));
        }

        tracing::debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "chat turn complete"
        );

        let mut history = self.history.lock();
        history.push(user);
        history.push(Message::assistant(response.content.clone()));
        let limit = self.seed.len() + 2 * self.max_turns;
        if history.len() > limit {
            let excess = history.len() - limit;
            let start = self.seed.len();
            history.drain(start..start + excess);
        }
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, Role, Usage};
    use async_trait::async_trait;

    /// Echoes the number of messages it was sent.
    struct CountingProvider {
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn default_model(&self) -> &str {
            "count-1"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
            if self.fail {
                return Err(LlmError::NetworkError("down".into()));
            }
            Ok(CompletionResponse {
                content: format!("saw {}", request.messages.len()),
                model: request.model,
                stop_reason: None,
                usage: Usage::default(),
            })
        }
    }

    #[tokio::test]
    async fn test_history_grows_on_success() {
        let seed = vec![Message::user("example"), Message::assistant("answer")];
        let chat = ChatSession::new(Arc::new(CountingProvider { fail: false }), seed);

        assert_eq!(chat.send_message("first").await.unwrap(), "saw 3");
        assert_eq!(chat.send_message("second").await.unwrap(), "saw 5");

        let history = chat.history();
        assert_eq!(history.len(), 6);
        assert_eq!(history[4].content, "second");
        assert_eq!(history[5].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_history_alone() {
        let chat = ChatSession::new(Arc::new(CountingProvider { fail: true }), Vec::new());
        assert!(chat.send_message("hello").await.is_err());
        assert!(chat.history().is_empty());
    }

    #[tokio::test]
    async fn test_reset_returns_to_seed() {
        let seed = vec![Message::user("example")];
        let chat = ChatSession::new(Arc::new(CountingProvider { fail: false }), seed.clone());
        chat.send_message("q").await.unwrap();
        chat.reset();
        assert_eq!(chat.history(), seed);
        assert_eq!(chat.model(), "count-1");
    }

    #[tokio::test]
    async fn test_history_is_capped_after_seed() {
        let seed = vec![Message::user("example"), Message::assistant("answer")];
        let chat = ChatSession::new(Arc::new(CountingProvider { fail: false }), seed.clone())
            .with_max_turns(2);

        for question in ["one", "two", "three"] {
            chat.send_message(question).await.unwrap();
        }

        let history = chat.history();
        assert_eq!(history.len(), 6);
        assert_eq!(history[..2], seed[..]);
        assert_eq!(history[2].content, "two");
        assert_eq!(history[4].content, "three");
    }
}
