use super::providers::{AnthropicProvider, GeminiProvider, OpenAIProvider};
use crate::config::constants::{providers, urls};
use crate::config::{ProviderConfig, ResolvedConfig};
use crate::llm::provider::{LLMError, LLMProvider};
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::debug;

/// Wire format spoken by a configured provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI chat completions, with an optional default endpoint
    OpenAICompatible { default_base_url: &'static str },
    Anthropic,
    Gemini,
}

impl ProviderKind {
    /// Resolve a provider name from the configuration file.
    ///
    /// Names are matched case-insensitively; anything unrecognised is
    /// treated as an OpenAI-compatible endpoint.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            providers::ANTHROPIC => ProviderKind::Anthropic,
            providers::GOOGLE | providers::GEMINI => ProviderKind::Gemini,
            providers::DEEPSEEK => ProviderKind::OpenAICompatible {
                default_base_url: urls::DEEPSEEK_API_BASE,
            },
            providers::XAI => ProviderKind::OpenAICompatible {
                default_base_url: urls::XAI_API_BASE,
            },
            providers::OPENROUTER => ProviderKind::OpenAICompatible {
                default_base_url: urls::OPENROUTER_API_BASE,
            },
            _ => ProviderKind::OpenAICompatible {
                default_base_url: urls::OPENAI_API_BASE,
            },
        }
    }
}

/// Create provider for the model selected in `config`
pub fn create_provider(config: &ResolvedConfig) -> Result<Box<dyn LLMProvider>, LLMError> {
    create_provider_with_config(config.provider_name(), config.provider(), config.request_timeout)
}

/// Create provider with full configuration
pub fn create_provider_with_config(
    provider_name: &str,
    provider: &ProviderConfig,
    timeout: Duration,
) -> Result<Box<dyn LLMProvider>, LLMError> {
    let http_client = HttpClient::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LLMError::Network(format!("failed to build HTTP client: {e}")))?;

    let api_key = provider.api_key.clone();
    let base_url = provider
        .base_url
        .clone()
        .filter(|url| !url.trim().is_empty());
    let kind = ProviderKind::from_name(provider_name);
    debug!(provider = provider_name, ?kind, custom_base_url = base_url.is_some(), "creating provider");

    let client: Box<dyn LLMProvider> = match kind {
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(api_key, base_url, http_client, timeout)),
        ProviderKind::Gemini => Box::new(GeminiProvider::new(api_key, base_url, http_client, timeout)),
        ProviderKind::OpenAICompatible { default_base_url } => Box::new(OpenAIProvider::compatible(
            provider_name,
            api_key,
            base_url.unwrap_or_else(|| default_base_url.to_string()),
            http_client,
            timeout,
        )),
    };
    Ok(client)
}
