use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use is_terminal::IsTerminal;
use shai_core::config::constants::{CONFIG_COMMAND_ALIASES, EXIT_COMMANDS, REPL_PROMPT, env_vars};
use shai_core::config::{self, ConfigManager, load_dotenv};
use shai_core::core::{CommandPipeline, CommandRunner};
use shai_core::environment::SystemContext;
use shai_core::executor::ShellExecutor;
use shai_core::generator::LlmCommandGenerator;
use shai_core::i18n::{MessageKey, Messages};
use shai_core::ui::{Styles, TerminalPrompter, print_error};
use shai_core::ShaiError;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "shai",
    version,
    about = "Describe a task in plain language, review the generated shell command, run it"
)]
struct Cli {
    /// Configuration file to use instead of ~/.config/shai/config.yaml
    #[arg(long, short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,

    /// Model id or alias overriding `default_model`
    #[arg(long, short = 'm', value_name = "ID_OR_ALIAS")]
    model: Option<String>,

    /// Log debug details to stderr
    #[arg(long, short = 'v')]
    verbose: bool,

    /// What you want to do; starts an interactive prompt when omitted
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "REQUEST")]
    request: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            print_error("Error", format!("{e:#}"), None);
            1
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("shai=debug,shai_core=debug")
    } else {
        EnvFilter::try_from_env(env_vars::LOG_FILTER)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(cli: Cli) -> Result<i32> {
    load_dotenv();

    let manager = match cli.config {
        Some(path) => ConfigManager::new(path),
        None => ConfigManager::default_location().context("cannot locate the configuration file")?,
    };
    debug!(path = %manager.path().display(), "using configuration file");

    let context = SystemContext::detect();
    let mut messages = Messages::detect(None);
    let runner = CommandRunner::new(ShellExecutor::new(context.shell.clone()), messages);
    let mut prompter = TerminalPrompter::new();

    if !manager.exists() {
        return first_run(&manager, &runner, &messages, &mut prompter).await;
    }

    let request = cli.request.join(" ").trim().to_string();
    if is_config_command(&request) {
        return show_edit_command(&manager, &runner, &messages, &mut prompter).await;
    }

    let resolved = match manager.load(cli.model.as_deref()) {
        Ok(resolved) => resolved,
        Err(e) => {
            report(&e, &messages);
            show_edit_command(&manager, &runner, &messages, &mut prompter).await?;
            return Ok(1);
        }
    };
    let resolved = config::init_global(resolved);

    if resolved.language.is_some() {
        messages = Messages::detect(resolved.language);
    }
    let runner = CommandRunner::new(ShellExecutor::new(context.shell.clone()), messages);

    let generator = match LlmCommandGenerator::from_config(resolved, &context) {
        Ok(generator) => generator,
        Err(e) => {
            report(&ShaiError::from(e), &messages);
            return Ok(1);
        }
    };
    let pipeline = CommandPipeline::new(Box::new(generator), runner, messages)
        .with_spinner(io::stderr().is_terminal());

    if request.is_empty() {
        repl(&manager, &pipeline, &messages, &mut prompter).await
    } else {
        match pipeline.handle(&request, &mut prompter).await {
            Ok(outcome) => Ok(outcome.exit_code()),
            Err(e) => {
                report(&e, &messages);
                Ok(1)
            }
        }
    }
}

/// Write the template, optionally filling in the API key, then offer the editor
async fn first_run(
    manager: &ConfigManager,
    runner: &CommandRunner,
    messages: &Messages,
    prompter: &mut TerminalPrompter,
) -> Result<i32> {
    let api_key = if io::stdin().is_terminal() {
        dialoguer::Password::new()
            .with_prompt(messages.get(MessageKey::ApiKeyPrompt))
            .allow_empty_password(true)
            .interact()
            .ok()
    } else {
        None
    };

    manager
        .write_template(api_key.as_deref())
        .context("failed to create the configuration file")?;
    eprintln!(
        "{} {}",
        messages.get(MessageKey::ConfigCreated),
        style(manager.path().display()).yellow()
    );

    show_edit_command(manager, runner, messages, prompter).await
}

async fn show_edit_command(
    manager: &ConfigManager,
    runner: &CommandRunner,
    messages: &Messages,
    prompter: &mut TerminalPrompter,
) -> Result<i32> {
    let command = manager.edit_command(messages);
    match runner.run(command, prompter).await {
        Ok(outcome) => Ok(outcome.exit_code()),
        Err(e) => {
            report(&e, messages);
            Ok(1)
        }
    }
}

async fn repl(
    manager: &ConfigManager,
    pipeline: &CommandPipeline,
    messages: &Messages,
    prompter: &mut TerminalPrompter,
) -> Result<i32> {
    let mut last_code = 0;
    loop {
        print!("{}", Styles::prompt().apply_to(REPL_PROMPT));
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.iter().any(|cmd| line.eq_ignore_ascii_case(cmd)) {
            break;
        }

        let result = if is_config_command(line) {
            let command = manager.edit_command(messages);
            pipeline.runner().run(command, prompter).await
        } else {
            pipeline.handle(line, prompter).await
        };

        match result {
            Ok(outcome) => last_code = outcome.exit_code(),
            Err(e) if e.is_fatal() => {
                report(&e, messages);
                return Ok(1);
            }
            Err(e) => {
                report(&e, messages);
                last_code = 1;
            }
        }
    }
    Ok(last_code)
}

fn is_config_command(request: &str) -> bool {
    CONFIG_COMMAND_ALIASES
        .iter()
        .any(|alias| request.eq_ignore_ascii_case(alias))
}

fn report(error: &ShaiError, messages: &Messages) {
    print_error(messages.get(MessageKey::ErrorLabel), error, error.hint(messages));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_words_are_collected() {
        let cli = Cli::parse_from(["shai", "list", "all", "text", "files"]);
        assert_eq!(cli.request.join(" "), "list all text files");
        assert!(cli.config.is_none());
    }

    #[test]
    fn flags_precede_the_request() {
        let cli = Cli::parse_from(["shai", "--model", "gpt", "-v", "show", "-la", "output"]);
        assert_eq!(cli.model.as_deref(), Some("gpt"));
        assert!(cli.verbose);
        assert_eq!(cli.request, vec!["show", "-la", "output"]);
    }

    #[test]
    fn config_aliases_are_case_insensitive() {
        assert!(is_config_command("config"));
        assert!(is_config_command("CFG"));
        assert!(is_config_command("comfig"));
        assert!(!is_config_command("config please"));
        assert!(!is_config_command(""));
    }
}
