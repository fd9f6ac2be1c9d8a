use crate::command::ShellCommand;
use crate::config::api_keys::{self, MissingSecretError};
use crate::config::constants::{app, defaults, env_vars};
use crate::config::types::{Language, ModelConfig, ProviderConfig, ShaiConfig};
use crate::error::ShaiError;
use crate::i18n::{MessageKey, Messages};
use crate::safety::RiskTier;
use indexmap::IndexMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const TEMPLATE: &str = include_str!("../config.template.yaml");

/// Structural problems with the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot determine the home directory")]
    NoHomeDir,

    #[error("configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("`{0}` must declare at least one entry")]
    Empty(&'static str),

    #[error("`{0}` must not be empty")]
    EmptyValue(String),

    #[error("model not found: `{0}`")]
    ModelNotFound(String),

    #[error("provider not configured: `{provider}` (referenced by model `{model}`)")]
    ProviderNotConfigured { model: String, provider: String },
}

/// Configuration with every reference resolved and every secret expanded.
///
/// Built once per process and treated as read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub default_model: String,
    pub providers: IndexMap<String, ProviderConfig>,
    pub models: Vec<ModelConfig>,
    pub request_timeout: Duration,
    pub language: Option<Language>,
    model: ModelConfig,
    provider: ProviderConfig,
}

impl ResolvedConfig {
    /// Validate `raw`, select a model and expand secrets.
    ///
    /// `model_override` replaces `default_model` for the selection only.
    /// Structural errors are reported before any secret is looked up.
    pub fn resolve<F>(
        raw: ShaiConfig,
        model_override: Option<&str>,
        lookup: F,
    ) -> Result<Self, ShaiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_model = raw
            .default_model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .ok_or(ConfigError::MissingField("default_model"))?;
        let providers = raw.providers.ok_or(ConfigError::MissingField("providers"))?;
        let models = raw.models.ok_or(ConfigError::MissingField("models"))?;

        if providers.is_empty() {
            return Err(ConfigError::Empty("providers").into());
        }
        if models.is_empty() {
            return Err(ConfigError::Empty("models").into());
        }

        for (name, provider) in &providers {
            if provider.api_key.trim().is_empty() {
                return Err(ConfigError::EmptyValue(format!("providers.{name}.api_key")).into());
            }
        }

        for (index, model) in models.iter().enumerate() {
            if model.id.trim().is_empty() {
                return Err(ConfigError::EmptyValue(format!("models[{index}].id")).into());
            }
            if model.provider.trim().is_empty() {
                return Err(ConfigError::EmptyValue(format!("models[{index}].provider")).into());
            }
            if !providers.contains_key(&model.provider) {
                return Err(ConfigError::ProviderNotConfigured {
                    model: model.id.clone(),
                    provider: model.provider.clone(),
                }
                .into());
            }
        }

        let target = model_override.unwrap_or(default_model.as_str());
        let model = models
            .iter()
            .find(|m| m.matches(target))
            .cloned()
            .ok_or_else(|| ConfigError::ModelNotFound(target.to_string()))?;

        let providers = expand_provider_secrets(providers, &lookup)?;
        let provider = providers
            .get(&model.provider)
            .cloned()
            .ok_or_else(|| ConfigError::ProviderNotConfigured {
                model: model.id.clone(),
                provider: model.provider.clone(),
            })?;

        debug!(
            model = %model.id,
            provider = %model.provider,
            "resolved model selection"
        );

        Ok(Self {
            default_model,
            providers,
            models,
            request_timeout: Duration::from_secs(
                raw.request_timeout_secs
                    .filter(|secs| *secs > 0)
                    .unwrap_or(defaults::REQUEST_TIMEOUT_SECS),
            ),
            language: raw.language,
            model,
            provider,
        })
    }

    /// Selected model entry
    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Name of the provider backing the selected model
    pub fn provider_name(&self) -> &str {
        &self.model.provider
    }

    /// Provider backing the selected model, secrets expanded
    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }
}

fn expand_provider_secrets<F>(
    providers: IndexMap<String, ProviderConfig>,
    lookup: &F,
) -> Result<IndexMap<String, ProviderConfig>, MissingSecretError>
where
    F: Fn(&str) -> Option<String>,
{
    providers
        .into_iter()
        .map(|(name, provider)| {
            let api_key = api_keys::expand_env_refs(&provider.api_key, lookup)?;
            let base_url = provider
                .base_url
                .map(|url| api_keys::expand_env_refs(&url, lookup))
                .transpose()?;
            Ok::<_, MissingSecretError>((name, ProviderConfig { api_key, base_url }))
        })
        .collect()
}

/// Locates, creates and loads the configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Manager for an explicit file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Manager for `~/.config/shai/config.yaml`
    pub fn default_location() -> Result<Self, ConfigError> {
        Self::default_config_path()
            .map(Self::new)
            .ok_or(ConfigError::NoHomeDir)
    }

    /// Get the user's home directory path
    pub fn get_home_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            if !home.is_empty() {
                return Some(PathBuf::from(home));
            }
        }

        if let Ok(userprofile) = std::env::var("USERPROFILE") {
            if !userprofile.is_empty() {
                return Some(PathBuf::from(userprofile));
            }
        }

        dirs::home_dir()
    }

    pub fn default_config_path() -> Option<PathBuf> {
        Self::get_home_dir().map(|home| {
            home.join(app::CONFIG_PARENT_DIR)
                .join(app::NAME)
                .join(app::CONFIG_FILE_NAME)
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write the template if no file exists yet.
    ///
    /// Returns `true` when the file was created by this call.
    pub fn ensure_config(&self) -> Result<bool, ConfigError> {
        if self.exists() {
            return Ok(false);
        }
        self.write_template(None)?;
        Ok(true)
    }

    /// Template text, with `api_key` replacing the default provider's
    /// environment placeholder when given
    pub fn template(api_key: Option<&str>) -> String {
        match api_key.map(str::trim).filter(|key| !key.is_empty()) {
            Some(key) => TEMPLATE.replacen(
                defaults::TEMPLATE_API_KEY_PLACEHOLDER,
                &yaml_single_quoted(key),
                1,
            ),
            None => TEMPLATE.to_string(),
        }
    }

    /// Create parent directories and (over)write the template
    pub fn write_template(&self, api_key: Option<&str>) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&self.path, Self::template(api_key)).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        restrict_permissions(&self.path);

        debug!(path = %self.path.display(), "wrote configuration template");
        Ok(())
    }

    /// Parse YAML text without validating it
    pub fn parse_str(content: &str) -> Result<ShaiConfig, ConfigError> {
        // Empty and comment-only documents deserialise to null, not a mapping.
        if content.trim().is_empty() {
            return Ok(ShaiConfig::default());
        }
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        if value.is_null() {
            return Ok(ShaiConfig::default());
        }
        Ok(serde_yaml::from_value(value)?)
    }

    /// Read and parse the file without validating it
    pub fn read(&self) -> Result<ShaiConfig, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        Self::parse_str(&content)
    }

    /// Load and resolve against the process environment
    pub fn load(&self, model_override: Option<&str>) -> Result<ResolvedConfig, ShaiError> {
        self.load_with_env(model_override, api_keys::process_env)
    }

    /// Load and resolve against an arbitrary variable lookup
    pub fn load_with_env<F>(
        &self,
        model_override: Option<&str>,
        lookup: F,
    ) -> Result<ResolvedConfig, ShaiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = self.read()?;
        ResolvedConfig::resolve(raw, model_override, lookup)
    }

    /// Command that opens the configuration file in the user's editor.
    ///
    /// Presented through the normal confirmation flow as a Safe command.
    pub fn edit_command(&self, messages: &Messages) -> ShellCommand {
        let path = self.path.to_string_lossy();
        let command = if cfg!(windows) {
            format!("{} \"{path}\"", defaults::WINDOWS_EDITOR)
        } else {
            let editor = std::env::var(env_vars::EDITOR)
                .ok()
                .filter(|editor| !editor.trim().is_empty())
                .unwrap_or_else(|| defaults::EDITOR.to_string());
            format!("{editor} {}", shell_words::quote(&path))
        };

        ShellCommand {
            command,
            explanation: messages.get(MessageKey::ConfigEditExplanation).to_string(),
            risk: RiskTier::Safe,
        }
    }
}

fn yaml_single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!(path = %path.display(), error = %e, "failed to restrict config permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    const VALID: &str = r#"
default_model: deepseek
providers:
  deepseek:
    api_key: ${DEEPSEEK_API_KEY}
  openai:
    api_key: sk-literal
    base_url: https://example.test/v1
models:
  - id: deepseek-chat
    provider: deepseek
    alias: deepseek
  - id: gpt-4.1-mini
    provider: openai
"#;

    fn resolve(content: &str) -> Result<ResolvedConfig, ShaiError> {
        let raw = ConfigManager::parse_str(content)?;
        ResolvedConfig::resolve(raw, None, lookup(&[("DEEPSEEK_API_KEY", "abc123")]))
    }

    #[test]
    fn resolves_default_model_by_alias() {
        let config = resolve(VALID).unwrap();
        assert_eq!(config.model().id, "deepseek-chat");
        assert_eq!(config.provider_name(), "deepseek");
        assert_eq!(config.provider().api_key, "abc123");
        assert_eq!(
            config.request_timeout,
            Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn model_override_selects_other_entry() {
        let raw = ConfigManager::parse_str(VALID).unwrap();
        let config = ResolvedConfig::resolve(
            raw,
            Some("gpt-4.1-mini"),
            lookup(&[("DEEPSEEK_API_KEY", "abc123")]),
        )
        .unwrap();
        assert_eq!(config.provider_name(), "openai");
        assert_eq!(config.provider().api_key, "sk-literal");
        assert_eq!(
            config.provider().base_url.as_deref(),
            Some("https://example.test/v1")
        );
        assert_eq!(config.default_model, "deepseek");
    }

    #[test]
    fn missing_default_model_is_config_error() {
        let err = resolve("providers: {a: {api_key: k}}\nmodels: [{id: m, provider: a}]\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ShaiError::Config(ConfigError::MissingField("default_model"))
        ));
    }

    #[test]
    fn empty_models_is_config_error() {
        let err = resolve("default_model: m\nproviders: {a: {api_key: k}}\nmodels: []\n")
            .unwrap_err();
        assert!(matches!(err, ShaiError::Config(ConfigError::Empty("models"))));
    }

    #[test]
    fn blank_api_key_is_config_error() {
        let err = resolve(
            "default_model: m\nproviders: {a: {api_key: ''}}\nmodels: [{id: m, provider: a}]\n",
        )
        .unwrap_err();
        match err {
            ShaiError::Config(ConfigError::EmptyValue(field)) => {
                assert_eq!(field, "providers.a.api_key")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn structural_errors_win_over_missing_secrets() {
        let err = resolve(
            "default_model: nope\nproviders: {a: {api_key: '${UNSET}'}}\nmodels: [{id: m, provider: a}]\n",
        )
        .unwrap_err();
        assert!(matches!(err, ShaiError::Config(ConfigError::ModelNotFound(_))));
    }

    #[test]
    fn secrets_of_unselected_providers_are_checked() {
        let err = resolve(
            "default_model: m\nproviders:\n  a: {api_key: k}\n  b: {api_key: '${B_KEY}'}\nmodels:\n  - {id: m, provider: a}\n  - {id: n, provider: b}\n",
        )
        .unwrap_err();
        match err {
            ShaiError::MissingSecret(e) => assert_eq!(e.name, "B_KEY"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let config = resolve(
            "default_model: m\nrequest_timeout_secs: 0\nproviders: {a: {api_key: k}}\nmodels: [{id: m, provider: a}]\n",
        )
        .unwrap();
        assert_eq!(
            config.request_timeout,
            Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn empty_document_reports_first_missing_field() {
        let err = resolve("").unwrap_err();
        assert!(matches!(
            err,
            ShaiError::Config(ConfigError::MissingField("default_model"))
        ));
    }

    #[test]
    fn template_embeds_quoted_key() {
        let template = ConfigManager::template(Some("it's-a-key"));
        assert!(template.contains("api_key: 'it''s-a-key'"));
        assert!(!template.contains(defaults::TEMPLATE_API_KEY_PLACEHOLDER));

        let raw = ConfigManager::parse_str(&template).unwrap();
        let config = ResolvedConfig::resolve(raw, None, |_: &str| None).unwrap();
        assert_eq!(config.provider().api_key, "it's-a-key");
    }

    #[test]
    fn blank_key_keeps_placeholder() {
        assert_eq!(ConfigManager::template(Some("  ")), TEMPLATE);
        assert!(TEMPLATE.contains(defaults::TEMPLATE_API_KEY_PLACEHOLDER));
    }
}
