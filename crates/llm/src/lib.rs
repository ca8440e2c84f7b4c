//! Completion client crate for TextFusion.
//!
//! Provides a provider-agnostic abstraction over hosted chat-completion
//! models. Every supported provider speaks the OpenAI chat completions
//! protocol, so a single client implementation serves all of them.
//!
//! # Providers
//! - **Groq**: default (`https://api.groq.com/openai/v1`)
//! - **OpenAI**: `https://api.openai.com/v1`
//!
//! # Example
//! ```no_run
//! use textfusion_core::ApiKey;
//! use textfusion_llm::{ChatCompletionsClient, LlmClient, LlmRequest, ProviderType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ChatCompletionsClient::new(ProviderType::Groq, ApiKey::new("gsk-..."));
//! let request = LlmRequest::new("Hello, world!", "mixtral-8x7b-32768").with_temperature(0.0);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
pub use factory::create_client;
pub use providers::ChatCompletionsClient;
pub use types::ProviderType;
