//! Request lifecycle: generate, classify, confirm, execute.

use crate::command::ShellCommand;
use crate::error::ShaiError;
use crate::executor::{ExecutionOutcome, ShellExecutor};
use crate::generator::CommandGenerator;
use crate::llm::GenerationError;
use crate::i18n::{MessageKey, Messages};
use crate::safety::RiskClassifier;
use crate::ui::{Prompter, Spinner, Styles, UserConfirmation};
use tracing::{info, warn};

/// What became of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Executed(ExecutionOutcome),
    Declined,
}

impl RequestOutcome {
    /// Process exit code for a one-shot run
    pub fn exit_code(&self) -> i32 {
        match self {
            RequestOutcome::Executed(outcome) => outcome.exit_code(),
            RequestOutcome::Declined => 0,
        }
    }
}

/// Classify, confirm and execute an already proposed command
#[derive(Debug, Clone)]
pub struct CommandRunner {
    classifier: RiskClassifier,
    confirmation: UserConfirmation,
    executor: ShellExecutor,
    messages: Messages,
}

impl CommandRunner {
    pub fn new(executor: ShellExecutor, messages: Messages) -> Self {
        Self {
            classifier: RiskClassifier::new(),
            confirmation: UserConfirmation::new(messages),
            executor,
            messages,
        }
    }

    /// Run `command` if the user approves it at its effective tier.
    ///
    /// The effective tier is the stricter of the proposed label and the
    /// static classification.
    pub async fn run(
        &self,
        command: ShellCommand,
        prompter: &mut dyn Prompter,
    ) -> Result<RequestOutcome, ShaiError> {
        let assessment = self.classifier.classify(&command.command);
        let raised = assessment.tier > command.risk;
        if raised {
            warn!(
                proposed = %command.risk,
                classified = %assessment.tier,
                reason = assessment.reason.unwrap_or_default(),
                "raising risk tier"
            );
        }
        let reason = if raised { assessment.reason } else { None };
        let command = command.with_minimum_risk(assessment.tier);

        if !self.confirmation.confirm(&command, reason, prompter) {
            info!(risk = %command.risk, "command declined");
            return Ok(RequestOutcome::Declined);
        }

        let outcome = self.executor.execute(&command.command).await?;
        if !outcome.success() {
            eprintln!(
                "{}",
                Styles::error().apply_to(format!(
                    "{} {}",
                    self.messages.get(MessageKey::CommandFailed),
                    outcome
                        .code
                        .map_or_else(|| "signal".to_string(), |code| code.to_string())
                ))
            );
        }
        Ok(RequestOutcome::Executed(outcome))
    }
}

/// Full path from a natural-language request to an executed command
pub struct CommandPipeline {
    generator: Box<dyn CommandGenerator>,
    runner: CommandRunner,
    messages: Messages,
    show_spinner: bool,
}

impl CommandPipeline {
    pub fn new(generator: Box<dyn CommandGenerator>, runner: CommandRunner, messages: Messages) -> Self {
        Self {
            generator,
            runner,
            messages,
            show_spinner: true,
        }
    }

    pub fn with_spinner(mut self, show_spinner: bool) -> Self {
        self.show_spinner = show_spinner;
        self
    }

    pub fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    /// Handle one request end to end
    pub async fn handle(
        &self,
        request: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<RequestOutcome, ShaiError> {
        let command = self.generate(request).await?;
        self.runner.run(command, prompter).await
    }

    /// Ask the model for a command while the spinner runs
    pub async fn generate(&self, request: &str) -> Result<ShellCommand, ShaiError> {
        if request.trim().is_empty() {
            let message = self.messages.get(MessageKey::EmptyRequest).to_string();
            return Err(ShaiError::Generation(GenerationError::InvalidRequest(message)));
        }

        let spinner = if self.show_spinner {
            Spinner::new(self.messages.get(MessageKey::Thinking))
        } else {
            Spinner::hidden()
        };

        match self.generator.generate(request).await {
            Ok(command) => {
                spinner.finish_and_clear();
                info!(risk = %command.risk, "model proposed a command");
                Ok(command)
            }
            Err(e) => {
                spinner.finish_and_clear();
                Err(ShaiError::Generation(e))
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::Language;
    use crate::environment::ShellKind;
    use crate::llm::LLMError;
    use crate::safety::RiskTier;
    use crate::ui::ScriptedPrompter;
    use async_trait::async_trait;

    struct FixedGenerator(Result<ShellCommand, fn() -> LLMError>);

    #[async_trait]
    impl CommandGenerator for FixedGenerator {
        async fn generate(&self, _request: &str) -> Result<ShellCommand, GenerationError> {
            match &self.0 {
                Ok(command) => Ok(command.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn runner() -> CommandRunner {
        CommandRunner::new(
            ShellExecutor::new(ShellKind::Posix("/bin/sh".to_string())),
            Messages::default(),
        )
    }

    fn pipeline(command: ShellCommand) -> CommandPipeline {
        CommandPipeline::new(Box::new(FixedGenerator(Ok(command))), runner(), Messages::default())
            .with_spinner(false)
    }

    #[tokio::test]
    async fn approved_command_runs_and_reports_status() {
        let pipeline = pipeline(ShellCommand::new("exit 4", "", RiskTier::Safe));
        let mut prompter = ScriptedPrompter::new(["y"]);
        let outcome = pipeline.handle("fail on purpose", &mut prompter).await.unwrap();
        assert_eq!(outcome.exit_code(), 4);
    }

    #[tokio::test]
    async fn declined_command_does_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let command = ShellCommand::new(format!("touch {}", marker.display()), "", RiskTier::Caution);
        let mut prompter = ScriptedPrompter::new(["n"]);

        let outcome = pipeline(command).handle("make a file", &mut prompter).await.unwrap();
        assert_eq!(outcome, RequestOutcome::Declined);
        assert_eq!(outcome.exit_code(), 0);
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn classifier_raises_understated_risk() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("data");
        std::fs::create_dir(&target).unwrap();
        // Labelled safe, but recursive deletion is Danger: "y" must not be enough.
        let command = ShellCommand::new(format!("rm -rf {}", target.display()), "", RiskTier::Safe);
        let mut prompter = ScriptedPrompter::new(["y"]);

        let outcome = pipeline(command).handle("clean up", &mut prompter).await.unwrap();
        assert_eq!(outcome, RequestOutcome::Declined);
        assert!(target.exists());
    }

    #[tokio::test]
    async fn model_label_is_never_lowered() {
        let command = ShellCommand::new("true", "", RiskTier::Danger);
        let mut prompter = ScriptedPrompter::new(["y"]);
        let outcome = pipeline(command).handle("noop", &mut prompter).await.unwrap();
        assert_eq!(outcome, RequestOutcome::Declined);
    }

    #[tokio::test]
    async fn generation_errors_surface_as_generation() {
        let pipeline = CommandPipeline::new(
            Box::new(FixedGenerator(Err(|| LLMError::RateLimit))),
            runner(),
            Messages::default(),
        )
        .with_spinner(false);
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());

        let err = pipeline.handle("anything", &mut prompter).await.unwrap_err();
        assert!(matches!(err, ShaiError::Generation(LLMError::RateLimit)));
        assert!(!err.is_fatal());
        assert!(prompter.prompts().is_empty());
    }

    #[tokio::test]
    async fn blank_request_is_rejected_before_generation() {
        let pipeline = CommandPipeline::new(
            Box::new(FixedGenerator(Err(|| LLMError::Network("unreachable".to_string())))),
            runner(),
            Messages::new(Language::Zh),
        )
        .with_spinner(false);
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());

        match pipeline.handle("   ", &mut prompter).await {
            Err(ShaiError::Generation(LLMError::InvalidRequest(message))) => {
                assert_eq!(message, Messages::new(Language::Zh).get(MessageKey::EmptyRequest));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(prompter.prompts().is_empty());
    }
}
