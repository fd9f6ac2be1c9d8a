//! # LLM Integration Layer
//!
//! One trait, [`LLMProvider`], fronts every backend shai can talk to.
//!
//! ## Supported Providers
//!
//! | Config name | Wire format | Default endpoint |
//! |-------------|-------------|------------------|
//! | `openai` | chat completions | api.openai.com |
//! | `deepseek` | chat completions | api.deepseek.com |
//! | `xai` | chat completions | api.x.ai |
//! | `openrouter` | chat completions | openrouter.ai |
//! | `anthropic` | messages | api.anthropic.com |
//! | `google` / `gemini` | generateContent | generativelanguage.googleapis.com |
//! | anything else | chat completions | `base_url` from the config |
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use shai_core::config::ConfigManager;
//! use shai_core::llm::{LLMProvider, LLMRequest, Message, create_provider};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::default_location()?.load(None)?;
//! let provider = create_provider(&config)?;
//! let request = LLMRequest::new(
//!     config.model().id.clone(),
//!     vec![Message::user("list all text files".to_string())],
//! );
//! let response = provider.generate(request).await?;
//! println!("{}", response.content.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod factory;
pub mod provider;
pub mod providers;

pub use factory::{ProviderKind, create_provider, create_provider_with_config};
pub use provider::{
    FinishReason, LLMError, LLMProvider, LLMRequest, LLMResponse, Message, MessageRole, Usage,
};

/// Failure to obtain a command from the model: transport, provider or reply
pub type GenerationError = LLMError;
