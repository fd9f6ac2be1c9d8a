//! Confirmation gate between a proposed command and its execution.
//!
//! The bar rises with the tier:
//!
//! - **Safe**: one keystroke, `y` runs, anything else declines.
//! - **Caution**: a typed line, `y` or `yes` (any case) runs.
//! - **Danger**: a typed line that must be exactly `YES`.
//!
//! Every other answer, an empty line, end of input and read errors all
//! decline.

use super::styled::{Styles, command_marker, risk_label};
use crate::command::ShellCommand;
use crate::config::constants::DANGER_CONFIRMATION_PHRASE;
use crate::i18n::{MessageKey, Messages};
use crate::safety::RiskTier;
use dialoguer::{Confirm, Input};
use is_terminal::IsTerminal;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Source of the user's answers
pub trait Prompter {
    /// Yes/no question answered with a single key, defaulting to no
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;

    /// One typed line, without the trailing newline
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;
}

/// Prompter reading from the controlling terminal.
///
/// Falls back to plain line reads from stdin when stdin is not a terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }

    fn interactive() -> bool {
        io::stdin().is_terminal() && io::stderr().is_terminal()
    }

    fn read_plain_line(prompt: &str) -> io::Result<String> {
        eprint!("{prompt}: ");
        io::stderr().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        if !Self::interactive() {
            let line = Self::read_plain_line(&format!("{prompt} [y/N]"))?;
            return Ok(accepts(RiskTier::Safe, &line));
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .show_default(true)
            .wait_for_newline(false)
            .interact()
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        if !Self::interactive() {
            return Self::read_plain_line(prompt);
        }
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

/// Prompter that replays canned answers, for tests and scripted runs.
///
/// `confirm` takes the same answers as a typed Safe confirmation. Running out
/// of answers behaves like end of input.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// Prompts shown so far
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    fn next_answer(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left"))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        let answer = self.next_answer(prompt)?;
        Ok(accepts(RiskTier::Safe, &answer))
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.next_answer(prompt)
    }
}

/// Whether a typed answer approves a command of `tier`
pub fn accepts(tier: RiskTier, input: &str) -> bool {
    match tier {
        RiskTier::Danger => input.trim() == DANGER_CONFIRMATION_PHRASE,
        RiskTier::Safe | RiskTier::Caution => {
            let answer = input.trim();
            answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
        }
    }
}

/// Text shown above the confirmation prompt
pub fn render_command(command: &ShellCommand, reason: Option<&str>, messages: &Messages) -> String {
    let mut lines = vec![format!(
        "{} {}",
        command_marker(),
        Styles::risk(command.risk).apply_to(&command.command)
    )];
    if !command.explanation.is_empty() {
        lines.push(command.explanation.clone());
    }
    let mut risk_line = format!("[{}] {}", risk_label(command.risk), messages.get(MessageKey::RiskLabel));
    if let Some(reason) = reason {
        risk_line.push_str(&format!(": {reason}"));
    }
    lines.push(Styles::hint().apply_to(risk_line).to_string());
    lines.join("\n")
}

/// Asks the user to approve a command according to its tier
#[derive(Debug, Clone, Copy)]
pub struct UserConfirmation {
    messages: Messages,
}

impl UserConfirmation {
    pub fn new(messages: Messages) -> Self {
        Self { messages }
    }

    /// Show `command` and collect the user's decision.
    ///
    /// Returns `false` for every failure to obtain an explicit approval.
    pub fn confirm(
        &self,
        command: &ShellCommand,
        reason: Option<&str>,
        prompter: &mut dyn Prompter,
    ) -> bool {
        eprintln!();
        eprintln!("{}", render_command(command, reason, &self.messages));
        eprintln!();

        let approved = match command.risk {
            RiskTier::Safe => prompter
                .confirm(self.messages.get(MessageKey::ExecutePrompt))
                .unwrap_or_else(|e| declined_on_error(&e)),
            RiskTier::Caution => prompter
                .read_line(&format!(
                    "{} [y/N]",
                    self.messages.get(MessageKey::CautionPrompt)
                ))
                .map(|answer| accepts(RiskTier::Caution, &answer))
                .unwrap_or_else(|e| declined_on_error(&e)),
            RiskTier::Danger => prompter
                .read_line(&format!(
                    "{} {}",
                    risk_label(RiskTier::Danger),
                    self.messages.get(MessageKey::DangerPrompt)
                ))
                .map(|answer| accepts(RiskTier::Danger, &answer))
                .unwrap_or_else(|e| declined_on_error(&e)),
        };

        if !approved {
            let key = if command.risk == RiskTier::Danger {
                MessageKey::DangerCancelled
            } else {
                MessageKey::CommandNotExecuted
            };
            eprintln!("{}", self.messages.get(key));
        }
        debug!(risk = %command.risk, approved, "confirmation finished");
        approved
    }
}

fn declined_on_error(error: &io::Error) -> bool {
    debug!(error = %error, "confirmation input unavailable, declining");
    false
}
