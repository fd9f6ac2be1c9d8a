/// Application identity and on-disk layout
pub mod app {
    pub const NAME: &str = "shai";
    /// Directory under the user's home that holds the config directory
    pub const CONFIG_PARENT_DIR: &str = ".config";
    pub const CONFIG_FILE_NAME: &str = "config.yaml";
}

/// Defaults applied when optional configuration keys are absent
pub mod defaults {
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;
    pub const MAX_TOKENS: u32 = 1024;
    pub const TEMPERATURE: f32 = 0.0;
    pub const TEMPLATE_API_KEY_PLACEHOLDER: &str = "${DEEPSEEK_API_KEY}";
    pub const EDITOR: &str = "vim";
    pub const WINDOWS_EDITOR: &str = "notepad";
    pub const UNIX_SHELL: &str = "/bin/sh";
}

/// Provider names recognised by the client factory
pub mod providers {
    pub const OPENAI: &str = "openai";
    pub const DEEPSEEK: &str = "deepseek";
    pub const XAI: &str = "xai";
    pub const OPENROUTER: &str = "openrouter";
    pub const ANTHROPIC: &str = "anthropic";
    pub const GOOGLE: &str = "google";
    pub const GEMINI: &str = "gemini";
}

/// Default API endpoints per provider
pub mod urls {
    pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
    pub const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com";
    pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
    pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";
    pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
    pub const XAI_API_BASE: &str = "https://api.x.ai/v1";
}

/// Message role strings shared by the OpenAI-compatible and Anthropic formats
pub mod message_roles {
    pub const SYSTEM: &str = "system";
    pub const USER: &str = "user";
    pub const ASSISTANT: &str = "assistant";
}

/// Environment variables consulted by shai itself
pub mod env_vars {
    pub const LOG_FILTER: &str = "SHAI_LOG";
    pub const EDITOR: &str = "EDITOR";
    pub const SHELL: &str = "SHELL";
    /// Locale variables in precedence order
    pub const LOCALE: &[&str] = &["LC_ALL", "LC_MESSAGES", "LANG"];
}

/// Words that open the configuration file instead of generating a command
pub const CONFIG_COMMAND_ALIASES: &[&str] = &["config", "configure", "cfg", "confg", "comfig"];

/// Words that leave the interactive prompt
pub const EXIT_COMMANDS: &[&str] = &["exit", "quit"];

/// Exact input required to run a Danger command
pub const DANGER_CONFIRMATION_PHRASE: &str = "YES";

/// Prompt shown by the interactive loop
pub const REPL_PROMPT: &str = ">> ";
