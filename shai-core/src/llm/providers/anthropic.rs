use crate::config::constants::{defaults, providers, urls};
use crate::llm::provider::{
    FinishReason, LLMError, LLMProvider, LLMRequest, LLMResponse, MessageRole, Usage,
};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// Client for the Anthropic Messages API
pub struct AnthropicProvider {
    api_key: String,
    http_client: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        http_client: HttpClient,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.unwrap_or_else(|| urls::ANTHROPIC_API_BASE.to_string());
        Self {
            api_key,
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    fn name(&self) -> &str {
        providers::ANTHROPIC
    }

    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
        self.validate_request(&request)?;
        let anthropic_request = convert_to_anthropic_format(&request)?;
        let url = format!("{}/messages", self.base_url);
        debug!(url = %url, model = %request.model, "sending anthropic message");

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", urls::ANTHROPIC_API_VERSION)
            .json(&anthropic_request)
            .send()
            .await
            .map_err(|e| LLMError::from_transport("Anthropic", e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::from_status("Anthropic", status, &error_text));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            LLMError::InvalidResponse(format!("Anthropic: failed to parse response: {e}"))
        })?;

        parse_anthropic_response(response_json)
    }
}

fn convert_to_anthropic_format(request: &LLMRequest) -> Result<Value, LLMError> {
    // System turns join the top-level system prompt.
    let mut system_parts: Vec<&str> = request.system_prompt.iter().map(String::as_str).collect();
    let mut messages = Vec::new();

    for msg in &request.messages {
        if msg.role == MessageRole::System {
            system_parts.push(&msg.content);
            continue;
        }
        if msg.content.is_empty() {
            continue;
        }
        messages.push(json!({
            "role": msg.role.as_anthropic_str(),
            "content": [{"type": "text", "text": msg.content}]
        }));
    }

    if messages.is_empty() {
        return Err(LLMError::InvalidRequest(
            "No convertible messages for Anthropic request".to_string(),
        ));
    }

    let mut anthropic_request = json!({
        "model": request.model,
        "messages": messages,
        "max_tokens": request.max_tokens.unwrap_or(defaults::MAX_TOKENS),
    });

    if !system_parts.is_empty() {
        anthropic_request["system"] = json!(system_parts.join("\n\n"));
    }

    if let Some(temperature) = request.temperature {
        anthropic_request["temperature"] = json!(temperature);
    }

    Ok(anthropic_request)
}

fn parse_anthropic_response(response_json: Value) -> Result<LLMResponse, LLMError> {
    let content = response_json
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| LLMError::InvalidResponse("missing content".to_string()))?;

    let text_parts: Vec<&str> = content
        .iter()
        .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
        .collect();

    let finish_reason = match response_json
        .get("stop_reason")
        .and_then(|sr| sr.as_str())
        .unwrap_or("end_turn")
    {
        "end_turn" | "stop_sequence" => FinishReason::Stop,
        "max_tokens" => FinishReason::Length,
        other => FinishReason::Error(other.to_string()),
    };

    let usage = response_json.get("usage").map(|u| {
        let input = u.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
        let output = u.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
        Usage {
            prompt_tokens: input as u32,
            completion_tokens: output as u32,
            total_tokens: (input + output) as u32,
        }
    });

    Ok(LLMResponse {
        content: (!text_parts.is_empty()).then(|| text_parts.join("")),
        usage,
        finish_reason,
    })
}
