//! Top-level error for everything between reading the config and running a command.

use crate::config::{ConfigError, MissingSecretError};
use crate::i18n::{MessageKey, Messages};
use crate::llm::{GenerationError, LLMError};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    MissingSecret(#[from] MissingSecretError),

    #[error("command generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ShaiError {
    /// Config and secret errors end the process; the rest are per request
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShaiError::Config(_) | ShaiError::MissingSecret(_))
    }

    /// What the user can do about it, when there is something to say
    pub fn hint(&self, messages: &Messages) -> Option<&'static str> {
        match self {
            ShaiError::Config(_) => Some(messages.get(MessageKey::ConfigHint)),
            ShaiError::MissingSecret(_) => Some(messages.get(MessageKey::MissingSecretHint)),
            ShaiError::Generation(LLMError::Authentication(_)) => {
                Some(messages.get(MessageKey::AuthenticationHint))
            }
            ShaiError::Generation(LLMError::Timeout(_) | LLMError::Network(_)) => {
                Some(messages.get(MessageKey::NetworkHint))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;

    #[test]
    fn config_and_secret_errors_are_fatal() {
        assert!(ShaiError::from(ConfigError::MissingField("models")).is_fatal());
        assert!(
            ShaiError::from(MissingSecretError {
                name: "DEEPSEEK_API_KEY".to_string()
            })
            .is_fatal()
        );
        assert!(!ShaiError::from(LLMError::RateLimit).is_fatal());
    }

    #[test]
    fn generation_errors_only_end_the_request() {
        let err: GenerationError = LLMError::Timeout(std::time::Duration::from_secs(60));
        let err = ShaiError::from(err);
        assert!(matches!(err, ShaiError::Generation(LLMError::Timeout(_))));
        assert!(!err.is_fatal());
    }

    #[test]
    fn secret_error_names_the_variable() {
        let err = ShaiError::from(MissingSecretError {
            name: "DEEPSEEK_API_KEY".to_string(),
        });
        assert!(err.to_string().contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn hints_follow_the_failure() {
        let messages = Messages::new(Language::En);
        assert!(
            ShaiError::from(ConfigError::Empty("models"))
                .hint(&messages)
                .is_some()
        );
        assert!(ShaiError::from(LLMError::RateLimit).hint(&messages).is_none());
    }
}
