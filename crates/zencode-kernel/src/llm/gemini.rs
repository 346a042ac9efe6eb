//! Google Gemini provider implementation.
//!
//! Talks to the `generateContent` REST endpoint directly with `reqwest`.
//! Request and response bodies are built/parsed by pure functions so the wire
//! format can be tested without a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, LlmResult, ProviderConfig,
    Role, Usage,
};

/// Gemini provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    default_model: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("endpoint", &self.endpoint)
            .field("default_model", &self.default_model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl GeminiProvider {
    /// Create a provider from config. A missing key is not an error here;
    /// requests fail with [`LlmError::Unavailable`] instead.
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.resolve_api_key(),
            endpoint: config.endpoint().to_string(),
            default_model: config.model().to_string(),
        }
    }

    /// Create a provider with an explicit API key and the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(&ProviderConfig::default().with_api_key(api_key))
    }

    fn url(&self, model: &str, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint, model, api_key
        )
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::Unavailable("no Gemini API key configured".into()))?;

        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };
        let body = request_body(&request);

        tracing::debug!(model = %model, turns = request.messages.len(), "sending generateContent");

        let response = self
            .client
            .post(self.url(&model, api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::ApiError(format!("malformed response: {e}")))?;
        parse_response(parsed, &model)
    }
}

// ============================================================================
// Wire format
// ============================================================================

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

/// Build the JSON body for `generateContent`.
pub(crate) fn request_body(request: &CompletionRequest) -> Value {
    let contents: Vec<Value> = request
        .messages
        .iter()
        .map(|m| json!({ "role": wire_role(m.role), "parts": [{ "text": m.content }] }))
        .collect();

    let g = &request.generation;
    let mut generation = serde_json::Map::new();
    if let Some(t) = g.temperature {
        generation.insert("temperature".into(), json!(t));
    }
    if let Some(p) = g.top_p {
        generation.insert("topP".into(), json!(p));
    }
    if let Some(k) = g.top_k {
        generation.insert("topK".into(), json!(k));
    }
    generation.insert("maxOutputTokens".into(), json!(g.max_output_tokens));
    if let Some(mime) = &g.response_mime_type {
        generation.insert("responseMimeType".into(), json!(mime));
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": Value::Object(generation),
    });
    if !request.safety.is_empty() {
        body["safetySettings"] = json!(request.safety);
    }
    body
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize, Serialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Turn a decoded response into our neutral shape.
pub(crate) fn parse_response(
    response: GenerateContentResponse,
    model: &str,
) -> LlmResult<CompletionResponse> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        return Err(LlmError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::ApiError("response had no candidates".into()))?;

    let content: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if content.is_empty()
        && let Some(reason) = candidate
            .finish_reason
            .as_deref()
            .filter(|r| *r == "SAFETY" || *r == "RECITATION")
    {
        return Err(LlmError::Blocked(reason.to_string()));
    }

    let usage = response
        .usage_metadata
        .map(|u| Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content,
        model: model.to_string(),
        stop_reason: candidate.finish_reason,
        usage,
    })
}

/// Map a non-2xx status and its body onto an [`LlmError`].
pub(crate) fn status_error(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {status}"));

    match status {
        401 | 403 => LlmError::AuthError(message),
        429 => LlmError::RateLimited(message),
        400 | 404 => LlmError::InvalidRequest(message),
        _ => LlmError::ApiError(message),
    }
}
