//! User-facing strings in English and Chinese.
//!
//! The language comes from `language:` in the config when set, otherwise
//! from the locale variables (`LC_ALL`, `LC_MESSAGES`, `LANG`, first
//! non-empty one wins). Anything that does not mention Chinese is English.

use crate::config::Language;
use crate::config::api_keys::process_env;
use crate::config::constants::env_vars;

/// Identifies one catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Thinking,
    ExecutePrompt,
    CautionPrompt,
    DangerPrompt,
    DangerCancelled,
    CommandNotExecuted,
    CommandFailed,
    ConfigEditExplanation,
    ConfigCreated,
    ConfigHint,
    MissingSecretHint,
    AuthenticationHint,
    NetworkHint,
    ApiKeyPrompt,
    EmptyRequest,
    ErrorLabel,
    RiskLabel,
}

/// Message catalog for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    language: Language,
}

impl Messages {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Catalog for the configured language, else the process locale
    pub fn detect(configured: Option<Language>) -> Self {
        Self::new(configured.unwrap_or_else(|| detect_language(process_env)))
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn get(&self, key: MessageKey) -> &'static str {
        match self.language {
            Language::En => english(key),
            Language::Zh => chinese(key),
        }
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::new(Language::En)
    }
}

/// Pick a language from locale variables read through `lookup`
pub fn detect_language<F>(lookup: F) -> Language
where
    F: Fn(&str) -> Option<String>,
{
    let locale = env_vars::LOCALE
        .iter()
        .find_map(|name| lookup(name).filter(|value| !value.trim().is_empty()));

    match locale {
        Some(value) => {
            let value = value.to_ascii_lowercase();
            if value.starts_with("zh") || value.contains("chinese") {
                Language::Zh
            } else {
                Language::En
            }
        }
        None => Language::En,
    }
}

fn english(key: MessageKey) -> &'static str {
    match key {
        MessageKey::Thinking => "Thinking...",
        MessageKey::ExecutePrompt => "Execute this command?",
        MessageKey::CautionPrompt => "This command may change your system. Type y to execute",
        MessageKey::DangerPrompt => "This command is DANGEROUS. Type YES to execute",
        MessageKey::DangerCancelled => "Dangerous command cancelled.",
        MessageKey::CommandNotExecuted => "Command not executed.",
        MessageKey::CommandFailed => "Command execution failed, exit code:",
        MessageKey::ConfigEditExplanation => {
            "Opens the configuration file in your editor. Set the provider API key and \
             model there so shai can reach the model. Run `shai config` to show this \
             command again."
        }
        MessageKey::ConfigCreated => "Created configuration file:",
        MessageKey::ConfigHint => "Fix the configuration file, or run `shai config` to edit it.",
        MessageKey::MissingSecretHint => {
            "Export the variable in your shell or add it to a .env file, then try again."
        }
        MessageKey::AuthenticationHint => "Check the api_key of the selected provider.",
        MessageKey::NetworkHint => {
            "Check your network connection and the provider's base_url, or raise request_timeout_secs."
        }
        MessageKey::ApiKeyPrompt => "DeepSeek API key (leave empty to fill in later)",
        MessageKey::EmptyRequest => "Task description cannot be empty",
        MessageKey::ErrorLabel => "Error",
        MessageKey::RiskLabel => "risk",
    }
}

fn chinese(key: MessageKey) -> &'static str {
    match key {
        MessageKey::Thinking => "思考中...",
        MessageKey::ExecutePrompt => "执行此命令？",
        MessageKey::CautionPrompt => "此命令可能修改系统状态。输入 y 执行",
        MessageKey::DangerPrompt => "此命令具有危险性。输入 YES 执行",
        MessageKey::DangerCancelled => "危险命令已取消。",
        MessageKey::CommandNotExecuted => "命令未执行。",
        MessageKey::CommandFailed => "命令执行失败，错误码:",
        MessageKey::ConfigEditExplanation => {
            "该命令将使用默认编辑器打开配置文件。请配置服务商的 api key 及模型，\
             以便程序能够正常调用模型接口。任何时候可以通过 `shai config` 显示此命令。"
        }
        MessageKey::ConfigCreated => "已创建配置文件:",
        MessageKey::ConfigHint => "请修正配置文件，或运行 `shai config` 进行编辑。",
        MessageKey::MissingSecretHint => "请在 shell 中导出该变量或写入 .env 文件后重试。",
        MessageKey::AuthenticationHint => "请检查所选服务商的 api_key。",
        MessageKey::NetworkHint => "请检查网络连接与服务商的 base_url，或调大 request_timeout_secs。",
        MessageKey::ApiKeyPrompt => "DeepSeek API key（留空可稍后填写）",
        MessageKey::EmptyRequest => "任务描述不能为空",
        MessageKey::ErrorLabel => "错误",
        MessageKey::RiskLabel => "风险",
    }
}
