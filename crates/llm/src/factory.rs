//! Completion client factory.
//!
//! Resolves a provider name from configuration into a ready client.

use crate::client::LlmClient;
use crate::providers::ChatCompletionsClient;
use crate::types::ProviderType;
use std::sync::Arc;
use textfusion_core::{ApiKey, AppError, AppResult};

/// Create a completion client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("groq", "openai")
/// * `endpoint` - Optional base URL overriding the provider default
/// * `api_key` - Provider credential (required by every hosted provider)
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or the key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&ApiKey>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    let api_key = api_key.cloned().ok_or_else(|| {
        AppError::Config(format!(
            "{} provider requires an API key",
            provider_type.as_str()
        ))
    })?;

    let mut client = ChatCompletionsClient::new(provider_type, api_key);
    if let Some(endpoint) = endpoint {
        client = client.with_base_url(endpoint);
    }

    tracing::debug!(provider = provider_type.as_str(), "Created completion client");

    Ok(Arc::new(client))
}
