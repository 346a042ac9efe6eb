//! AI assist request coordination.
//!
//! The coordinator turns (current code, question) into one chat turn and the
//! model's reply into a renderable HTML fragment. It owns the only lock-like
//! resource in the session: a single in-flight flag. The flag is taken
//! synchronously by [`AssistCoordinator::try_begin`] and released when the
//! returned [`AssistTicket`] drops, on success, failure, timeout, or
//! cancellation alike.
//!
//! ```text
//!   try_begin() ──Busy──▶ caller shows "busy", remote never called
//!       │
//!       ▼ AssistTicket (flag held)
//!   send(code, question)
//!       │  prompt ─▶ ChatSession ─▶ provider   (bounded by timeout)
//!       ▼
//!   strip fences ─▶ HtmlSanitizer ─▶ Ok(html) | Err(AssistError)
//!       │
//!       ▼ ticket dropped, flag released
//! ```

mod sanitize;

pub use sanitize::{HtmlSanitizer, ScriptStripper, TrustedSource};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::Instrument;

use crate::llm::{ChatSession, LlmError, Message};

/// Why an assist request produced no new answer.
#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    /// Another request is still in flight.
    #[error("an assist request is already in progress")]
    Busy,

    /// The signed-in user is not on the paid tier (or not resolved yet).
    #[error("AI assist is available to Pro subscribers only")]
    NotSubscribed,

    /// The assist panel is not open.
    #[error("assist panel is closed")]
    PanelClosed,

    /// No answer within the bounded wait.
    #[error("assist request timed out after {0:?}")]
    Timeout(Duration),

    /// The model answered, but with nothing renderable.
    #[error("assist response was empty")]
    EmptyResponse,

    /// The provider failed.
    #[error(transparent)]
    Provider(#[from] LlmError),
}

/// Outcome of one assist request: a sanitized HTML fragment or an error.
pub type AssistResult = Result<String, AssistError>;

/// Build the prompt for one question about the current code.
pub fn build_prompt(code: &str, question: &str) -> String {
    format!(
        "existing code: {code}, if there is an existing code, help to debug or improve it \
         further. Answer the question of the user which is: {question}. Provide an answer \
         based on the question or a personalized suggestion based on the existing code if \
         any. Provide a code snippet if necessary to help. Generate the response in html \
         format without the DOCTYPE, html, head, title, meta, and body tags, only the content."
    )
}

/// Seed exchange that shows the model the expected answer format.
pub fn priming_history() -> Vec<Message> {
    let question = build_prompt(
        r#"console.log("Hello Wo)"#,
        "Why am I getting an error, what is wrong with my code?",
    );
    let answer = "```html\n\
        <p>The string passed to <code>console.log</code> is never closed, so the parser \
        reaches the end of the line while still inside a string literal.</p>\n\
        <p>Your code: <code>console.log(\"Hello Wo)</code></p>\n\
        <p>Close the string before the parenthesis:</p>\n\
        <pre><code class=\"language-javascript\">console.log(\"Hello World\");</code></pre>\n\
        <p>Unmatched quotes, parentheses and brackets are the most common source of syntax \
        errors, so check that every opening character has a partner.</p>\n\
        ```\n";
    vec![Message::user(question), Message::assistant(answer)]
}

/// Remove Markdown fence delimiters (```` ```html ```` and ```` ``` ````)
/// wherever they appear, then trim.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```html", "").replace("```", "").trim().to_string()
}

/// Single-flight assist coordinator.
pub struct AssistCoordinator {
    chat: Arc<ChatSession>,
    sanitizer: Arc<dyn HtmlSanitizer>,
    timeout: Option<Duration>,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for AssistCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistCoordinator")
            .field("chat", &self.chat)
            .field("sanitizer", &self.sanitizer.name())
            .field("timeout", &self.timeout)
            .field("busy", &self.is_busy())
            .finish()
    }
}

impl AssistCoordinator {
    /// Coordinator with the trusted pass-through sanitizer and no timeout.
    pub fn new(chat: Arc<ChatSession>) -> Self {
        Self {
            chat,
            sanitizer: Arc::new(TrustedSource),
            timeout: None,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Replace the sanitation step between model text and rendered fragment.
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn HtmlSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Bound the wait for one request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    /// Whether a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Take the in-flight flag, or report `Busy` without touching the remote.
    pub fn try_begin(&self) -> Result<AssistTicket<'_>, AssistError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AssistError::Busy)?;
        Ok(AssistTicket { coordinator: self })
    }

    /// `try_begin` + `send` in one call.
    pub async fn ask(&self, code: &str, question: &str) -> AssistResult {
        self.try_begin()?.send(code, question).await
    }

    async fn run(&self, code: &str, question: &str) -> AssistResult {
        let prompt = build_prompt(code, question);
        let request = self.chat.send_message(&prompt);

        let text = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| AssistError::Timeout(limit))??,
            None => request.await?,
        };

        let fragment = strip_code_fences(&text);
        if fragment.is_empty() {
            return Err(AssistError::EmptyResponse);
        }
        Ok(self.sanitizer.sanitize(&fragment))
    }
}

/// Proof that the caller holds the in-flight flag.
///
/// Dropping the ticket (including dropping a pending `send` future) releases
/// the flag.
#[must_use = "dropping the ticket releases the assist slot immediately"]
pub struct AssistTicket<'a> {
    coordinator: &'a AssistCoordinator,
}

impl AssistTicket<'_> {
    /// Send the question and wait for the sanitized answer.
    pub async fn send(self, code: &str, question: &str) -> AssistResult {
        let span = tracing::info_span!(
            "assist.ask",
            code_len = code.len(),
            question_len = question.len()
        );
        let result = self
            .coordinator
            .run(code, question)
            .instrument(span)
            .await;

        match &result {
            Ok(html) => tracing::info!(html_len = html.len(), "assist response ready"),
            Err(e) => tracing::warn!(error = %e, "assist request failed"),
        }
        result
    }
}

impl Drop for AssistTicket<'_> {
    fn drop(&mut self) {
        self.coordinator.in_flight.store(false, Ordering::Release);
    }
}

// ============================================================================
// Tests
// ============================================================================
