use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;

use super::error::ApiError;
use super::history::{ConversationHistory, Role};
use super::provider::{Provider, resolve_model_name};
use super::repair::repair;
use crate::cancel::CancelToken;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Per-job completion parameters, already adapted to the provider.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    /// Model identifier as sent on the wire.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub system_prompt: String,
}

impl CompletionSettings {
    pub fn for_provider(
        provider: &Provider,
        model: &str,
        temperature: f32,
        system_prompt: String,
    ) -> Self {
        Self {
            model: resolve_model_name(provider, model),
            temperature,
            max_tokens: provider.max_tokens(model),
            system_prompt,
        }
    }
}

// Use Cow to avoid cloning history and batch text that are only borrowed for serialization
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message<'a>>,
    pub temperature: f32,
    pub response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub role: Role,
    pub content: Cow<'a, str>,
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl ResponseFormat {
    pub const fn json_object() -> Self {
        Self {
            kind: "json_object",
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// The assistant text and token usage of one successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCompletion {
    pub content: String,
    pub total_tokens: u64,
}

/// Something that can answer a chat-completion request.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatCompletion, ApiError>;
}

/// OpenAI-compatible HTTP transport.
pub struct HttpBackend {
    client: Client,
    chat_url: String,
    models_url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(provider: &Provider, api_key: Option<String>) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            chat_url: provider.chat_completions_url(),
            models_url: provider.models_url(),
            api_key,
        })
    }

    /// Lists the model ids visible to the configured key.
    pub async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        let mut http_request = self.client.get(&self.models_url);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let body = send(http_request).await?;
        let list: ModelList = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatCompletion, ApiError> {
        let mut http_request = self.client.post(&self.chat_url).json(request);

        // Add Authorization header if API key is present
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let body = send(http_request).await?;
        parse_completion(&body)
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<String, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(ApiError::from_status(status.as_u16(), &body))
    }
}

fn parse_completion(body: &str) -> Result<ChatCompletion, ApiError> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ApiError::InvalidResponse("no message content".to_string()))?;

    Ok(ChatCompletion {
        content,
        total_tokens: response.usage.map_or(0, |u| u.total_tokens),
    })
}

/// How often and how patiently a failed call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    /// Delay before the second attempt; doubled before each later one.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(2u32.saturating_pow(exponent))
            .unwrap_or(Duration::MAX)
    }
}

/// Result of one batch call after retries. `content` is `None` once the
/// retry budget is spent or the job was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReply {
    pub content: Option<String>,
    pub tokens: u64,
}

impl BatchReply {
    pub const fn failed() -> Self {
        Self {
            content: None,
            tokens: 0,
        }
    }
}

/// Builds the message list: system prompt, prior turns, then the batch.
pub fn build_messages<'a>(
    system_prompt: &'a str,
    history: &'a ConversationHistory,
    batch_text: &'a str,
) -> Vec<Message<'a>> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message {
        role: Role::System,
        content: Cow::Borrowed(system_prompt),
    });
    messages.extend(history.iter().map(|turn| Message {
        role: turn.role,
        content: Cow::Borrowed(turn.content.as_str()),
    }));
    messages.push(Message {
        role: Role::User,
        content: Cow::Borrowed(batch_text),
    });
    messages
}

/// Sends batches to a chat backend with retry and backoff.
pub struct TranslationClient<B> {
    backend: B,
    retry: RetryPolicy,
    cancel: CancelToken,
}

impl<B: ChatBackend> TranslationClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
            cancel: CancelToken::never(),
        }
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Translates one batch, retrying failed calls with doubling backoff.
    ///
    /// The returned content has already been through
    /// [`repair`](super::repair::repair). Errors never escape: after the
    /// last failed attempt the reply is [`BatchReply::failed`].
    pub async fn translate_batch(
        &self,
        batch_no: usize,
        batch_text: &str,
        settings: &CompletionSettings,
        history: &ConversationHistory,
    ) -> BatchReply {
        let request = ChatRequest {
            model: &settings.model,
            messages: build_messages(&settings.system_prompt, history, batch_text),
            temperature: settings.temperature,
            response_format: ResponseFormat::json_object(),
            max_tokens: settings.max_tokens,
            stream: false,
        };

        let max_attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            if self.cancel.is_cancelled() {
                return BatchReply::failed();
            }

            let err = match self.backend.complete(&request).await {
                Ok(completion) => {
                    return BatchReply {
                        content: Some(repair(&completion.content)),
                        tokens: completion.total_tokens,
                    };
                }
                Err(err) => err,
            };

            let remaining = max_attempts - attempt;
            if remaining == 0 {
                crate::warn!(
                    "Batch {batch_no}: {} after {max_attempts} attempts: {err}",
                    err.kind()
                );
                break;
            }

            let delay = self.retry.delay_after(attempt);
            crate::warn!(
                "Batch {batch_no}: {err} (attempt {attempt}/{max_attempts}), retrying in {:.0?} ({remaining} left)",
                delay
            );

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.cancel.cancelled() => return BatchReply::failed(),
            }
        }

        BatchReply::failed()
    }
}
