//! Schema of `config.yaml`.
//!
//! Required keys are modelled as `Option` so that a missing key surfaces as a
//! [`ConfigError::MissingField`](crate::config::ConfigError::MissingField)
//! naming the key, instead of a generic deserialisation message.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration file as written by the user
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ShaiConfig {
    /// Model id or alias used for generation
    #[serde(default)]
    pub default_model: Option<String>,

    /// Named provider backends, in declaration order
    #[serde(default)]
    pub providers: Option<IndexMap<String, ProviderConfig>>,

    /// Declared models
    #[serde(default)]
    pub models: Option<Vec<ModelConfig>>,

    /// Upper bound for a single provider call
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Interface language override
    #[serde(default)]
    pub language: Option<Language>,
}

/// Credentials and endpoint for one provider
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub api_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

// Keys never reach logs or panic messages.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// A model bound to one provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelConfig {
    pub id: String,
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ModelConfig {
    /// Whether `name` selects this model by id or alias
    pub fn matches(&self, name: &str) -> bool {
        self.id == name || self.alias.as_deref() == Some(name)
    }
}

/// Languages with a message catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "zh" | "chinese" => Ok(Language::Zh),
            other => Err(format!("unsupported language `{other}`")),
        }
    }
}
