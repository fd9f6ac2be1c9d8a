//! # shai-core - natural language to shell commands
//!
//! `shai-core` turns a request such as "list all text files" into a shell
//! command proposed by an LLM, grades the command's risk, asks the user to
//! confirm at a strength matching that risk, and runs it in the user's shell.
//!
//! ## Modules
//!
//! - `config/`: `~/.config/shai/config.yaml` loading, validation and
//!   `${ENV_VAR}` secret expansion.
//! - `llm/`: provider clients for the OpenAI, Anthropic and Gemini formats.
//! - `generator`: system prompt plus provider call, parsed into a
//!   [`ShellCommand`].
//! - `safety/`: [`RiskTier`] and the static [`RiskClassifier`].
//! - `ui/`: spinner, colours and the confirmation gate.
//! - `executor`: runs approved commands with inherited stdio.
//! - `core/`: the request pipeline tying the above together.
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use shai_core::config::ConfigManager;
//! use shai_core::core::{CommandPipeline, CommandRunner};
//! use shai_core::environment::SystemContext;
//! use shai_core::executor::ShellExecutor;
//! use shai_core::generator::LlmCommandGenerator;
//! use shai_core::i18n::Messages;
//! use shai_core::ui::TerminalPrompter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigManager::default_location()?.load(None)?;
//!     let context = SystemContext::detect();
//!     let messages = Messages::detect(config.language);
//!
//!     let generator = LlmCommandGenerator::from_config(&config, &context)?;
//!     let runner = CommandRunner::new(ShellExecutor::new(context.shell.clone()), messages);
//!     let pipeline = CommandPipeline::new(Box::new(generator), runner, messages);
//!
//!     let outcome = pipeline
//!         .handle("list all text files", &mut TerminalPrompter::new())
//!         .await?;
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

pub mod command;
pub mod config;
pub mod core;
pub mod environment;
pub mod error;
pub mod executor;
pub mod generator;
pub mod i18n;
pub mod llm;
pub mod prompts;
pub mod safety;
pub mod ui;

// Re-exports for convenience
pub use command::ShellCommand;
pub use config::{ConfigError, ConfigManager, MissingSecretError, ResolvedConfig, ShaiConfig};
pub use crate::core::{CommandPipeline, CommandRunner, RequestOutcome};
pub use environment::{ShellKind, SystemContext};
pub use error::ShaiError;
pub use executor::{ExecutionOutcome, ShellExecutor};
pub use generator::{CommandGenerator, LlmCommandGenerator};
pub use i18n::{MessageKey, Messages};
pub use llm::{GenerationError, LLMError, LLMProvider};
pub use safety::{Assessment, RiskClassifier, RiskTier};
