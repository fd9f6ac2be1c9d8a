//! Turns a natural-language request into a [`ShellCommand`] via an LLM.

use crate::command::ShellCommand;
use crate::config::ResolvedConfig;
use crate::config::constants::defaults;
use crate::environment::SystemContext;
use crate::llm::{GenerationError, LLMError, LLMProvider, LLMRequest, Message, create_provider};
use crate::prompts::generate_system_instruction;
use async_trait::async_trait;
use tracing::{debug, info};

/// Anything that can propose a command for a request
#[async_trait]
pub trait CommandGenerator: Send + Sync {
    async fn generate(&self, request: &str) -> Result<ShellCommand, GenerationError>;
}

/// Generator backed by the configured provider and model
pub struct LlmCommandGenerator {
    provider: Box<dyn LLMProvider>,
    model: String,
    system_prompt: String,
}

impl LlmCommandGenerator {
    pub fn new(provider: Box<dyn LLMProvider>, model: impl Into<String>, context: &SystemContext) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: generate_system_instruction(context),
        }
    }

    /// Generator for the model selected in `config`
    pub fn from_config(config: &ResolvedConfig, context: &SystemContext) -> Result<Self, LLMError> {
        let provider = create_provider(config)?;
        Ok(Self::new(provider, config.model().id.clone(), context))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: &str) -> LLMRequest {
        LLMRequest::new(self.model.clone(), vec![Message::user(request.to_string())])
            .with_system_prompt(self.system_prompt.clone())
            .with_max_tokens(defaults::MAX_TOKENS)
            .with_temperature(defaults::TEMPERATURE)
    }
}

#[async_trait]
impl CommandGenerator for LlmCommandGenerator {
    async fn generate(&self, request: &str) -> Result<ShellCommand, GenerationError> {
        let request = request.trim();
        if request.is_empty() {
            return Err(LLMError::InvalidRequest("request is empty".to_string()));
        }

        debug!(provider = self.provider.name(), model = %self.model, "generating command");
        let response = self.provider.generate(self.build_request(request)).await?;
        if let Some(usage) = response.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "generation finished"
            );
        }

        let content = response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LLMError::InvalidResponse("model returned no content".to_string()))?;
        ShellCommand::from_model_output(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ShellKind;
    use crate::llm::{FinishReason, LLMResponse};
    use crate::safety::RiskTier;
    use std::sync::Mutex;

    struct CannedProvider {
        reply: Option<String>,
        seen: Mutex<Vec<LLMRequest>>,
    }

    #[async_trait]
    impl LLMProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
            self.seen.lock().unwrap().push(request);
            Ok(LLMResponse {
                content: self.reply.clone(),
                usage: None,
                finish_reason: FinishReason::Stop,
            })
        }
    }

    fn context() -> SystemContext {
        SystemContext {
            os_name: "Linux".to_string(),
            os_version: "6.8".to_string(),
            kernel_version: None,
            arch: "x86_64".to_string(),
            shell: ShellKind::Posix("/bin/bash".to_string()),
        }
    }

    fn generator(reply: Option<&str>) -> LlmCommandGenerator {
        let provider = CannedProvider {
            reply: reply.map(str::to_string),
            seen: Mutex::new(Vec::new()),
        };
        LlmCommandGenerator::new(Box::new(provider), "deepseek-chat", &context())
    }

    #[tokio::test]
    async fn parses_model_reply() {
        let generator = generator(Some(
            r#"{"command": "find . -name '*.txt'", "explanation": "Find text files", "risk": "safe"}"#,
        ));
        let command = generator.generate("list all text files").await.unwrap();
        assert_eq!(command.command, "find . -name '*.txt'");
        assert_eq!(command.risk, RiskTier::Safe);
    }

    #[tokio::test]
    async fn request_carries_model_and_system_prompt() {
        let generator = generator(Some(r#"{"command": "ls"}"#));
        let request = generator.build_request("list");
        assert_eq!(request.model, "deepseek-chat");
        assert_eq!(request.messages, vec![Message::user("list".to_string())]);
        assert!(
            request
                .system_prompt
                .as_deref()
                .is_some_and(|p| p.contains("Shell: bash"))
        );
    }

    #[tokio::test]
    async fn empty_request_is_rejected() {
        let err = generator(Some("{}")).generate("   ").await.unwrap_err();
        assert!(matches!(err, LLMError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn empty_reply_is_invalid_response() {
        let err = generator(None).generate("list files").await.unwrap_err();
        assert!(matches!(err, LLMError::InvalidResponse(_)));
    }
}
