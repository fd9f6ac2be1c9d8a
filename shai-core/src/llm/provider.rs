//! Provider-neutral request/response types and the provider trait.
//!
//! Three wire formats sit behind [`LLMProvider`]:
//!
//! - **OpenAI chat completions**: `system`, `user`, `assistant` roles in one
//!   `messages` array. DeepSeek, xAI, OpenRouter and local servers speak it.
//! - **Anthropic messages**: the system prompt is a top-level `system` field.
//! - **Gemini generateContent**: roles are `user` and `model`; the system
//!   prompt travels as `systemInstruction`.

use crate::config::constants::message_roles;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Universal LLM request structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMRequest {
    pub messages: Vec<Message>,
    pub system_prompt: Option<String>,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl LLMRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            messages,
            system_prompt: None,
            model: model.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Checks shared by every provider
    pub fn validate(&self) -> Result<(), LLMError> {
        if self.messages.is_empty() {
            return Err(LLMError::InvalidRequest(
                "Messages cannot be empty".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(LLMError::InvalidRequest("Model cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Universal message structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: String) -> Self {
        Self {
            role: MessageRole::User,
            content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Role string for the OpenAI chat format
    pub fn as_openai_str(&self) -> &'static str {
        match self {
            MessageRole::System => message_roles::SYSTEM,
            MessageRole::User => message_roles::USER,
            MessageRole::Assistant => message_roles::ASSISTANT,
        }
    }

    /// Role string for Anthropic; system turns are hoisted before this is used
    pub fn as_anthropic_str(&self) -> &'static str {
        match self {
            MessageRole::System | MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    /// Gemini only knows `user` and `model`
    pub fn as_gemini_str(&self) -> &'static str {
        match self {
            MessageRole::System | MessageRole::User => "user",
            MessageRole::Assistant => "model",
        }
    }
}

/// Universal LLM response
#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: Option<String>,
    pub usage: Option<Usage>,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error(String),
}

/// Universal LLM provider trait
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Provider name (e.g., "openai", "anthropic", "gemini")
    fn name(&self) -> &str;

    /// Generate completion
    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse, LLMError>;

    /// Validate request for this provider
    fn validate_request(&self, request: &LLMRequest) -> Result<(), LLMError> {
        request.validate()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LLMError {
    /// Map a non-success HTTP status and body to an error
    pub fn from_status(provider: &str, status: StatusCode, body: &str) -> Self {
        let detail = format!("{provider} HTTP {status}: {}", error_message(body));
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LLMError::Authentication(detail),
            StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimit,
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                LLMError::InvalidRequest(detail)
            }
            _ => LLMError::Provider(detail),
        }
    }

    /// Map a transport failure, distinguishing timeouts
    pub fn from_transport(provider: &str, error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            LLMError::Timeout(timeout)
        } else {
            LLMError::Network(format!("{provider}: {error}"))
        }
    }
}

/// Pull `error.message` out of a JSON error body, else return it trimmed
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .or_else(|| value.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
