//! Completion client abstraction and request/response types.

use futures::Stream;
use std::pin::Pin;
use textfusion_core::AppResult;

/// Completion request.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The rendered prompt, sent as the user message
    pub prompt: String,

    /// Model identifier (e.g., "mixtral-8x7b-32768")
    pub model: String,

    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: Option<f32>,

    /// Enable streaming responses
    pub stream: bool,

    /// System prompt (optional)
    pub system: Option<String>,
}

impl LlmRequest {
    /// Create a new request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            temperature: None,
            stream: false,
            system: None,
        }
    }

    /// Enable streaming for this request.
    pub fn with_streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Completion response.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    pub usage: LlmUsage,

    /// Why generation stopped, as reported by the provider
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LlmUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,

    /// Total tokens used
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A chunk from a streaming response.
#[derive(Debug, Clone)]
pub struct LlmStreamChunk {
    /// Incremental text content
    pub content: String,

    /// Model generating the stream
    pub model: String,

    /// Whether this is the final chunk
    pub done: bool,

    /// Usage statistics (only on the chunk that reports them)
    pub usage: Option<LlmUsage>,
}

/// Stream of completion chunks.
pub type LlmStream = Pin<Box<dyn Stream<Item = AppResult<LlmStreamChunk>> + Send>>;

/// Trait for completion providers.
///
/// Implementations turn a rendered prompt into generated text. Every failure
/// (transport, credential, rate limit, malformed response) is reported as
/// `AppError::Completion`; no distinction is made between kinds here.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "groq", "openai").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;

    /// Perform a streaming completion.
    ///
    /// The stream ends with a chunk whose `done` flag is set.
    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream>;
}
