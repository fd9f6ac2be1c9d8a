use crate::config::constants::{providers, urls};
use crate::llm::provider::{
    FinishReason, LLMError, LLMProvider, LLMRequest, LLMResponse, MessageRole, Usage,
};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// Client for the Gemini `generateContent` API
pub struct GeminiProvider {
    api_key: String,
    http_client: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        http_client: HttpClient,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.unwrap_or_else(|| urls::GEMINI_API_BASE.to_string());
        Self {
            api_key,
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn name(&self) -> &str {
        providers::GEMINI
    }

    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
        self.validate_request(&request)?;
        let gemini_request = convert_to_gemini_format(&request);
        let url = self.endpoint(&request.model);
        debug!(url = %url, "sending gemini generateContent");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| LLMError::from_transport("Gemini", e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if error_text.contains("RESOURCE_EXHAUSTED") {
                return Err(LLMError::RateLimit);
            }
            return Err(LLMError::from_status("Gemini", status, &error_text));
        }

        let gemini_response: Value = response.json().await.map_err(|e| {
            LLMError::InvalidResponse(format!("Gemini: failed to parse response: {e}"))
        })?;

        convert_from_gemini_format(gemini_response)
    }
}

fn convert_to_gemini_format(request: &LLMRequest) -> Value {
    let mut system_parts: Vec<Value> = request
        .system_prompt
        .iter()
        .map(|text| json!({"text": text}))
        .collect();
    let mut contents = Vec::new();

    for message in &request.messages {
        if message.role == MessageRole::System {
            system_parts.push(json!({"text": message.content}));
            continue;
        }
        if message.content.is_empty() {
            continue;
        }
        contents.push(json!({
            "role": message.role.as_gemini_str(),
            "parts": [{"text": message.content}]
        }));
    }

    let mut gemini_request = json!({ "contents": contents });

    if !system_parts.is_empty() {
        gemini_request["systemInstruction"] = json!({ "parts": system_parts });
    }

    let mut generation_config = serde_json::Map::new();
    if let Some(max_tokens) = request.max_tokens {
        generation_config.insert("maxOutputTokens".to_string(), json!(max_tokens));
    }
    if let Some(temperature) = request.temperature {
        generation_config.insert("temperature".to_string(), json!(temperature));
    }
    if !generation_config.is_empty() {
        gemini_request["generationConfig"] = Value::Object(generation_config);
    }

    gemini_request
}

fn convert_from_gemini_format(response: Value) -> Result<LLMResponse, LLMError> {
    let candidate = response
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|candidates| candidates.first())
        .ok_or_else(|| {
            let reason = response
                .pointer("/promptFeedback/blockReason")
                .and_then(|r| r.as_str())
                .unwrap_or("no candidates in response");
            LLMError::InvalidResponse(format!("Gemini: {reason}"))
        })?;

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    let finish_reason = match candidate.get("finishReason").and_then(|f| f.as_str()) {
        Some("STOP") | None => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("RECITATION") => FinishReason::ContentFilter,
        Some(other) => FinishReason::Error(other.to_string()),
    };

    let usage = response.get("usageMetadata").map(|u| {
        let field = |name: &str| u.get(name).and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        Usage {
            prompt_tokens: field("promptTokenCount"),
            completion_tokens: field("candidatesTokenCount"),
            total_tokens: field("totalTokenCount"),
        }
    });

    Ok(LLMResponse {
        content: (!text.is_empty()).then_some(text),
        usage,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::Message;

    #[test]
    fn system_prompt_becomes_system_instruction() {
        let request = LLMRequest::new("gemini-2.5-flash", vec![Message::user("uptime".to_string())])
            .with_system_prompt("rules")
            .with_max_tokens(128)
            .with_temperature(0.0);
        let body = convert_to_gemini_format(&request);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "rules");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "uptime");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 128);
    }

    #[test]
    fn endpoint_embeds_model() {
        let provider = GeminiProvider::new(
            "k".to_string(),
            None,
            HttpClient::new(),
            Duration::from_secs(5),
        );
        assert_eq!(
            provider.endpoint("gemini-2.5-flash"),
            format!("{}/models/gemini-2.5-flash:generateContent", urls::GEMINI_API_BASE)
        );
    }

    #[test]
    fn concatenates_candidate_parts() {
        let response = convert_from_gemini_format(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"command\""}, {"text": ": \"ls\"}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2, "totalTokenCount": 6}
        }))
        .unwrap();

        assert_eq!(response.content.as_deref(), Some("{\"command\": \"ls\"}"));
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(6));
    }

    #[test]
    fn blocked_prompt_is_invalid_response() {
        let err = convert_from_gemini_format(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap_err();
        match err {
            LLMError::InvalidResponse(detail) => assert!(detail.contains("SAFETY")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
