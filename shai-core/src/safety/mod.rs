//! Risk assessment for generated shell commands
//!
//! Every command carries exactly one [`RiskTier`]. The tier decides how
//! strongly the user has to confirm before the command runs.

pub mod classifier;

pub use classifier::{Assessment, RiskClassifier};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a command, ordered from harmless to destructive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// No destructive or state-changing side effect
    #[default]
    Safe,
    /// May change state: writes files, installs packages, stops processes
    Caution,
    /// Destructive or privileged: recursive deletion, disk writes, sudo
    Danger,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Safe, RiskTier::Caution, RiskTier::Danger];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Safe => "safe",
            RiskTier::Caution => "caution",
            RiskTier::Danger => "danger",
        }
    }

    /// Whether running needs the strong, typed confirmation
    pub fn requires_strong_confirmation(&self) -> bool {
        matches!(self, RiskTier::Danger)
    }

    /// Parse a tier label as produced by a model.
    ///
    /// Unknown labels land on Caution so an unexpected answer never lowers
    /// the bar below an explicit confirmation.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(RiskTier::Caution)
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "safe" | "low" => Ok(RiskTier::Safe),
            "caution" | "medium" | "moderate" => Ok(RiskTier::Caution),
            "danger" | "dangerous" | "high" => Ok(RiskTier::Danger),
            other => Err(format!("unknown risk tier `{other}`")),
        }
    }
}

impl<'de> Deserialize<'de> for RiskTier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(RiskTier::from_label(&label))
    }
}
