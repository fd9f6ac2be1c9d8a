use crate::config::constants::message_roles;
use crate::llm::provider::{
    FinishReason, LLMError, LLMProvider, LLMRequest, LLMResponse, Usage,
};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// Client for the OpenAI chat-completions format.
///
/// Also serves DeepSeek, xAI, OpenRouter and any self-hosted endpoint that
/// mirrors the format; only `name` and `base_url` differ.
pub struct OpenAIProvider {
    name: String,
    api_key: String,
    http_client: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl OpenAIProvider {
    /// OpenAI-format client under another provider's name
    pub fn compatible(
        name: impl Into<String>,
        api_key: String,
        base_url: String,
        http_client: HttpClient,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            api_key,
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
        self.validate_request(&request)?;
        let body = convert_to_openai_format(&request);
        let url = self.endpoint();
        debug!(provider = %self.name, url = %url, model = %request.model, "sending chat completion");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LLMError::from_transport(&self.name, e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::from_status(&self.name, status, &error_text));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            LLMError::InvalidResponse(format!("{}: failed to parse response: {e}", self.name))
        })?;

        parse_openai_response(response_json)
    }
}

pub(crate) fn convert_to_openai_format(request: &LLMRequest) -> Value {
    let mut messages = Vec::new();

    if let Some(system_prompt) = &request.system_prompt {
        messages.push(json!({
            "role": message_roles::SYSTEM,
            "content": system_prompt
        }));
    }

    for msg in &request.messages {
        messages.push(json!({
            "role": msg.role.as_openai_str(),
            "content": msg.content
        }));
    }

    let mut openai_request = json!({
        "model": request.model,
        "messages": messages,
        "stream": false
    });

    if let Some(max_tokens) = request.max_tokens {
        openai_request["max_tokens"] = json!(max_tokens);
    }

    if let Some(temperature) = request.temperature {
        openai_request["temperature"] = json!(temperature);
    }

    openai_request
}

pub(crate) fn parse_openai_response(response_json: Value) -> Result<LLMResponse, LLMError> {
    let choice = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .ok_or_else(|| LLMError::InvalidResponse("missing choices".to_string()))?;

    let message = choice
        .get("message")
        .ok_or_else(|| LLMError::InvalidResponse("missing message".to_string()))?;

    let content = message
        .get("content")
        .and_then(|c| c.as_str())
        .map(|s| s.to_string());

    let finish_reason = choice
        .get("finish_reason")
        .and_then(|fr| fr.as_str())
        .map(|fr| match fr {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Error(other.to_string()),
        })
        .unwrap_or(FinishReason::Stop);

    let usage = response_json.get("usage").map(|u| {
        let field = |name: &str| u.get(name).and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        Usage {
            prompt_tokens: field("prompt_tokens"),
            completion_tokens: field("completion_tokens"),
            total_tokens: field("total_tokens"),
        }
    });

    Ok(LLMResponse {
        content,
        usage,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::Message;

    #[test]
    fn request_puts_system_prompt_first() {
        let request = LLMRequest::new("deepseek-chat", vec![Message::user("list files".to_string())])
            .with_system_prompt("be terse")
            .with_max_tokens(256)
            .with_temperature(0.0);
        let body = convert_to_openai_format(&request);

        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be terse");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "list files");
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn parses_content_usage_and_finish_reason() {
        let response = parse_openai_response(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "{\"command\": \"ls\"}"},
                "finish_reason": "length"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();

        assert_eq!(response.content.as_deref(), Some("{\"command\": \"ls\"}"));
        assert_eq!(response.finish_reason, FinishReason::Length);
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(15));
    }

    #[test]
    fn missing_choices_is_invalid_response() {
        let err = parse_openai_response(json!({"choices": []})).unwrap_err();
        assert!(matches!(err, LLMError::InvalidResponse(_)));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = OpenAIProvider::compatible(
            "deepseek",
            "k".to_string(),
            "https://api.deepseek.com/".to_string(),
            HttpClient::new(),
            Duration::from_secs(5),
        );
        assert_eq!(provider.endpoint(), "https://api.deepseek.com/chat/completions");
        assert_eq!(provider.name(), "deepseek");
    }
}
