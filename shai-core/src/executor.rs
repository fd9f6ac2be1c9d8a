//! Runs an approved command through the user's shell.
//!
//! The child inherits stdin, stdout and stderr, so interactive programs and
//! pagers behave as if typed at the prompt. Output is never captured.

use crate::environment::ShellKind;
use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, info};

/// How a finished command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
}

impl ExecutionOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Code to exit shai with: the command's own, or 1 for a signal
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(1)
    }
}

/// Executes commands in one shell
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: ShellKind,
}

impl ShellExecutor {
    pub fn new(shell: ShellKind) -> Self {
        Self { shell }
    }

    pub fn shell(&self) -> &ShellKind {
        &self.shell
    }

    /// Run `command` to completion with inherited stdio
    pub async fn execute(&self, command: &str) -> io::Result<ExecutionOutcome> {
        let (program, args) = self.shell.invocation(command);
        debug!(shell = %self.shell, program = %program, "spawning command");

        let status = Command::new(&program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        let outcome = ExecutionOutcome::from_status(status);
        info!(code = ?outcome.code, "command finished");
        Ok(outcome)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh() -> ShellExecutor {
        ShellExecutor::new(ShellKind::Posix("/bin/sh".to_string()))
    }

    #[tokio::test]
    async fn exit_status_is_passed_through() {
        let outcome = sh().execute("exit 3").await.unwrap();
        assert_eq!(outcome.code, Some(3));
        assert!(!outcome.success());
        assert_eq!(outcome.exit_code(), 3);
    }

    #[tokio::test]
    async fn successful_command() {
        let outcome = sh().execute("true").await.unwrap();
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn runs_through_the_shell() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let command = format!("echo hi | tr a-z A-Z > {}", marker.display());
        sh().execute(&command).await.unwrap();
        assert_eq!(std::fs::read_to_string(marker).unwrap().trim(), "HI");
    }

    #[tokio::test]
    async fn killed_by_signal_maps_to_one() {
        let outcome = sh().execute("kill -9 $$").await.unwrap();
        assert_eq!(outcome.code, None);
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test]
    async fn missing_shell_is_an_io_error() {
        let executor = ShellExecutor::new(ShellKind::Posix("/nonexistent/shell".to_string()));
        assert!(executor.execute("true").await.is_err());
    }
}
