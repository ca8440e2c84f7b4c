//! OpenAI-compatible chat completions provider.
//!
//! Serves Groq (the default) and OpenAI. The rendered prompt is sent as a
//! single user message, preceded by a system message only when one is set.
//! API reference: https://console.groq.com/docs/api-reference#chat-create

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use crate::types::ProviderType;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use textfusion_core::{ApiKey, AppError, AppResult};

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Non-streaming response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl From<ChatUsage> for LlmUsage {
    fn from(usage: ChatUsage) -> Self {
        LlmUsage::new(usage.prompt_tokens, usage.completion_tokens)
    }
}

/// One `data:` payload of a streaming response.
#[derive(Debug, Deserialize)]
struct ChatStreamEvent {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatStreamChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    /// Groq reports stream usage here instead of top-level `usage`
    #[serde(default)]
    x_groq: Option<GroqExtension>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqExtension {
    #[serde(default)]
    usage: Option<ChatUsage>,
}

/// Chat completions client.
pub struct ChatCompletionsClient {
    provider: ProviderType,

    /// Base URL of the OpenAI-compatible API (without `/chat/completions`)
    base_url: String,

    api_key: ApiKey,

    /// HTTP client
    client: reqwest::Client,
}

impl ChatCompletionsClient {
    /// Create a client for the provider's default endpoint.
    pub fn new(provider: ProviderType, api_key: ApiKey) -> Self {
        Self {
            provider,
            base_url: provider.default_endpoint().to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at a different base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert LlmRequest to the wire format.
    fn to_chat_request<'a>(&self, request: &'a LlmRequest, stream: bool) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            stream,
        }
    }

    /// Convert the wire response to LlmResponse.
    fn convert_response(&self, response: ChatResponse, requested_model: &str) -> AppResult<LlmResponse> {
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            AppError::Completion(format!(
                "{} returned a response with no choices",
                self.provider.as_str()
            ))
        })?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            model: response
                .model
                .unwrap_or_else(|| requested_model.to_string()),
            usage: response.usage.map(LlmUsage::from).unwrap_or_default(),
            finish_reason: choice.finish_reason,
        })
    }

    async fn send(&self, body: &ChatRequest<'_>) -> AppResult<reqwest::Response> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                AppError::Completion(format!(
                    "Failed to send request to {}: {}",
                    self.provider.as_str(),
                    e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Completion(format!(
                "{} API error ({}): {}",
                self.provider.as_str(),
                status,
                error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl LlmClient for ChatCompletionsClient {
    fn provider_name(&self) -> &str {
        self.provider.as_str()
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(provider = self.provider.as_str(), model = %request.model, "Sending completion request");
        tracing::debug!(prompt_bytes = request.prompt.len(), "Completion request");

        let body = self.to_chat_request(request, false);
        let response = self.send(&body).await?;

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            AppError::Completion(format!(
                "Failed to parse {} response: {}",
                self.provider.as_str(),
                e
            ))
        })?;

        let response = self.convert_response(chat_response, &request.model)?;

        tracing::info!("Received completion");
        tracing::debug!(
            "Token usage - Prompt: {}, Completion: {}, Total: {}",
            response.usage.prompt_tokens,
            response.usage.completion_tokens,
            response.usage.total_tokens
        );

        Ok(response)
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::info!(provider = self.provider.as_str(), model = %request.model, "Starting streaming request");

        let body = self.to_chat_request(request, true);
        let response = self.send(&body).await?;

        let model = request.model.clone();
        let stream = response
            .bytes_stream()
            .scan(SseDecoder::new(model), |decoder, result| {
                let chunks = match result {
                    Ok(bytes) => decoder.push(&bytes),
                    Err(e) => vec![Err(AppError::Completion(format!("Stream error: {}", e)))],
                };
                futures::future::ready(Some(futures::stream::iter(chunks)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }
}

/// Incremental decoder for `text/event-stream` bodies.
///
/// Network chunks may split a line anywhere (including inside a multi-byte
/// character), so bytes are buffered until a full line is available. A
/// trailing line without a newline is never emitted.
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    model: String,
}

impl SseDecoder {
    pub(crate) fn new(model: impl Into<String>) -> Self {
        Self {
            buffer: Vec::new(),
            model: model.into(),
        }
    }

    /// Feed raw bytes, returning every chunk completed by them.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<AppResult<LlmStreamChunk>> {
        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(chunk) = parse_sse_line(&line, &self.model) {
                chunks.push(chunk);
            }
        }
        chunks
    }
}

/// Parse one event-stream line into a chunk.
///
/// Returns `None` for blank lines, comments and non-data fields.
fn parse_sse_line(line: &str, model: &str) -> Option<AppResult<LlmStreamChunk>> {
    let line = line.trim();
    let data = line.strip_prefix("data:")?.trim_start();

    if data == "[DONE]" {
        return Some(Ok(LlmStreamChunk {
            content: String::new(),
            model: model.to_string(),
            done: true,
            usage: None,
        }));
    }

    let event: ChatStreamEvent = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(e) => {
            return Some(Err(AppError::Completion(format!(
                "Failed to parse chunk: {}",
                e
            ))))
        }
    };

    if let Some(error) = event.error {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Some(Err(AppError::Completion(format!("Stream error: {}", message))));
    }

    let content = event
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default();

    let usage = event
        .usage
        .or_else(|| event.x_groq.and_then(|x| x.usage))
        .map(LlmUsage::from);

    Some(Ok(LlmStreamChunk {
        content,
        model: event.model.unwrap_or_else(|| model.to_string()),
        done: false,
        usage,
    }))
}
