//! Host facts that shape both generation and execution: OS and shell.

use crate::config::api_keys::process_env;
use crate::config::constants::{defaults, env_vars};
use std::fmt;
use std::path::Path;
use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

/// How many ancestors to inspect when looking for the invoking shell
const MAX_PARENT_DEPTH: usize = 5;

/// The shell commands are handed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellKind {
    /// POSIX-style shell invoked as `<path> -c <command>`
    Posix(String),
    PowerShell,
    Cmd,
}

impl ShellKind {
    /// Shell for this process: parent walk on Windows, `$SHELL` elsewhere
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::from_ancestor_names(parent_process_names(MAX_PARENT_DEPTH))
        } else {
            Self::from_env(process_env)
        }
    }

    /// `$SHELL`, falling back to `/bin/sh`
    pub fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let shell = lookup(env_vars::SHELL)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| defaults::UNIX_SHELL.to_string());
        ShellKind::Posix(shell)
    }

    /// Pick a shell from ancestor process names, nearest first.
    ///
    /// Names of interpreters and launchers in between (`shai`, `cargo`,
    /// `conhost`) are skipped. Defaults to `cmd`.
    pub fn from_ancestor_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref().to_ascii_lowercase();
            let stem = name.strip_suffix(".exe").unwrap_or(&name);
            if stem.contains("pwsh") || stem.contains("powershell") {
                return ShellKind::PowerShell;
            }
            if stem == "cmd" {
                return ShellKind::Cmd;
            }
            if matches!(stem, "bash" | "zsh" | "fish" | "sh" | "nu") {
                return ShellKind::Posix(stem.to_string());
            }
        }
        ShellKind::Cmd
    }

    /// Program and arguments that run `command` in this shell
    pub fn invocation(&self, command: &str) -> (String, Vec<String>) {
        match self {
            ShellKind::Posix(shell) => (shell.clone(), vec!["-c".to_string(), command.to_string()]),
            ShellKind::PowerShell => (
                "powershell".to_string(),
                vec![
                    "-NoProfile".to_string(),
                    "-Command".to_string(),
                    command.to_string(),
                ],
            ),
            ShellKind::Cmd => ("cmd".to_string(), vec!["/C".to_string(), command.to_string()]),
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellKind::Posix(shell) => {
                let name = Path::new(shell)
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_else(|| shell.into());
                f.write_str(&name)
            }
            ShellKind::PowerShell => f.write_str("PowerShell"),
            ShellKind::Cmd => f.write_str("Windows CMD"),
        }
    }
}

fn parent_process_names(depth: usize) -> Vec<String> {
    let Ok(mut pid) = sysinfo::get_current_pid() else {
        return Vec::new();
    };
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);

    let mut names = Vec::new();
    for _ in 0..depth {
        let Some(parent) = system.process(pid).and_then(|p| p.parent()) else {
            break;
        };
        let Some(process) = system.process(parent) else {
            break;
        };
        names.push(process.name().to_string_lossy().into_owned());
        pid = parent;
    }
    debug!(?names, "inspected parent processes");
    names
}

/// Operating system and shell, described to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemContext {
    pub os_name: String,
    pub os_version: String,
    pub kernel_version: Option<String>,
    pub arch: String,
    pub shell: ShellKind,
}

impl SystemContext {
    pub fn detect() -> Self {
        Self {
            os_name: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            os_version: System::os_version().unwrap_or_else(|| "unknown".to_string()),
            kernel_version: System::kernel_version(),
            arch: std::env::consts::ARCH.to_string(),
            shell: ShellKind::detect(),
        }
    }

    /// Block of `Key: value` lines for the system prompt
    pub fn describe(&self) -> String {
        let mut lines = vec![
            format!("Operating System: {}", self.os_name),
            format!("System Version: {}", self.os_version),
        ];
        if let Some(kernel) = &self.kernel_version {
            lines.push(format!("Kernel: {kernel}"));
        }
        lines.push(format!("Architecture: {}", self.arch));
        lines.push(format!("Shell: {}", self.shell));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_env_var_wins() {
        let shell = ShellKind::from_env(|name| (name == "SHELL").then(|| "/bin/zsh".to_string()));
        assert_eq!(shell, ShellKind::Posix("/bin/zsh".to_string()));
        assert_eq!(shell.to_string(), "zsh");
    }

    #[test]
    fn missing_shell_falls_back_to_sh() {
        assert_eq!(ShellKind::from_env(|_| None), ShellKind::Posix("/bin/sh".to_string()));
        assert_eq!(
            ShellKind::from_env(|_| Some("  ".to_string())),
            ShellKind::Posix("/bin/sh".to_string())
        );
    }

    #[test]
    fn ancestors_identify_windows_shells() {
        assert_eq!(
            ShellKind::from_ancestor_names(["shai.exe", "pwsh.exe", "explorer.exe"]),
            ShellKind::PowerShell
        );
        assert_eq!(ShellKind::from_ancestor_names(["cargo.exe", "cmd.exe"]), ShellKind::Cmd);
        assert_eq!(
            ShellKind::from_ancestor_names(["bash.exe"]),
            ShellKind::Posix("bash".to_string())
        );
        assert_eq!(ShellKind::from_ancestor_names(Vec::<String>::new()), ShellKind::Cmd);
    }

    #[test]
    fn invocation_per_shell() {
        let (program, args) = ShellKind::Posix("/bin/bash".to_string()).invocation("ls");
        assert_eq!(program, "/bin/bash");
        assert_eq!(args, vec!["-c", "ls"]);

        let (program, args) = ShellKind::PowerShell.invocation("Get-ChildItem");
        assert_eq!(program, "powershell");
        assert_eq!(args.last().map(String::as_str), Some("Get-ChildItem"));

        let (program, args) = ShellKind::Cmd.invocation("dir");
        assert_eq!(program, "cmd");
        assert_eq!(args, vec!["/C", "dir"]);
    }

    #[test]
    fn describe_lists_os_and_shell() {
        let context = SystemContext {
            os_name: "Ubuntu".to_string(),
            os_version: "24.04".to_string(),
            kernel_version: Some("6.8.0".to_string()),
            arch: "x86_64".to_string(),
            shell: ShellKind::Posix("/bin/bash".to_string()),
        };
        let text = context.describe();
        assert!(text.contains("Operating System: Ubuntu"));
        assert!(text.contains("System Version: 24.04"));
        assert!(text.contains("Kernel: 6.8.0"));
        assert!(text.contains("Shell: bash"));
    }
}
