//! The unit of work passed from generation to confirmation to execution.

use crate::llm::provider::LLMError;
use crate::safety::RiskTier;
use serde::{Deserialize, Serialize};

/// A proposed shell command with its rationale and risk tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellCommand {
    pub command: String,
    #[serde(default)]
    pub explanation: String,
    /// Missing labels are treated as Caution
    #[serde(default = "unlabelled_risk")]
    pub risk: RiskTier,
}

fn unlabelled_risk() -> RiskTier {
    RiskTier::Caution
}

impl ShellCommand {
    pub fn new(command: impl Into<String>, explanation: impl Into<String>, risk: RiskTier) -> Self {
        Self {
            command: command.into(),
            explanation: explanation.into(),
            risk,
        }
    }

    /// Parse a model reply into a command.
    ///
    /// Accepts a bare JSON object, one wrapped in a Markdown code fence, or
    /// one surrounded by prose. Fails when no object with a non-empty
    /// `command` can be found.
    pub fn from_model_output(text: &str) -> Result<Self, LLMError> {
        let candidate = extract_json_object(text).ok_or_else(|| {
            LLMError::InvalidResponse(format!(
                "expected a JSON object with `command`, got: {}",
                preview(text)
            ))
        })?;

        let mut parsed: ShellCommand = serde_json::from_str(candidate).map_err(|e| {
            LLMError::InvalidResponse(format!("malformed command JSON ({e}): {}", preview(text)))
        })?;

        parsed.command = parsed.command.trim().to_string();
        parsed.explanation = parsed.explanation.trim().to_string();
        if parsed.command.is_empty() {
            return Err(LLMError::InvalidResponse(
                "model returned an empty command".to_string(),
            ));
        }
        Ok(parsed)
    }

    /// Raise the tier to at least `floor`
    pub fn with_minimum_risk(mut self, floor: RiskTier) -> Self {
        self.risk = self.risk.max(floor);
        self
    }
}

fn extract_json_object(text: &str) -> Option<&str> {
    let trimmed = strip_code_fence(text.trim());
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (`json`, `JSON`, ...) on the opening line.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 200;
    let trimmed = text.trim();
    if trimmed.chars().count() <= LIMIT {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(LIMIT).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_object() {
        let command = ShellCommand::from_model_output(
            r#"{"command": "find . -name '*.txt'", "explanation": "Lists text files", "risk": "safe"}"#,
        )
        .unwrap();
        assert_eq!(command.command, "find . -name '*.txt'");
        assert_eq!(command.explanation, "Lists text files");
        assert_eq!(command.risk, RiskTier::Safe);
    }

    #[test]
    fn parses_fenced_object() {
        let reply = "```json\n{\"command\": \"ls -la\", \"explanation\": \"List\", \"risk\": \"safe\"}\n```";
        let command = ShellCommand::from_model_output(reply).unwrap();
        assert_eq!(command.command, "ls -la");
    }

    #[test]
    fn parses_object_inside_prose() {
        let reply = "Sure! Here you go:\n{\"command\": \"df -h\", \"explanation\": \"Disk usage\", \"risk\": \"low\"}\nHope this helps.";
        let command = ShellCommand::from_model_output(reply).unwrap();
        assert_eq!(command.command, "df -h");
        assert_eq!(command.risk, RiskTier::Safe);
    }

    #[test]
    fn missing_risk_defaults_to_caution() {
        let command = ShellCommand::from_model_output(r#"{"command": "make"}"#).unwrap();
        assert_eq!(command.risk, RiskTier::Caution);
        assert!(command.explanation.is_empty());
    }

    #[test]
    fn rejects_prose_without_json() {
        let err = ShellCommand::from_model_output("I can't help with that.").unwrap_err();
        assert!(matches!(err, LLMError::InvalidResponse(_)));
    }

    #[test]
    fn rejects_empty_command() {
        let err = ShellCommand::from_model_output(r#"{"command": "   "}"#).unwrap_err();
        assert!(matches!(err, LLMError::InvalidResponse(_)));
    }

    #[test]
    fn minimum_risk_never_lowers() {
        let command = ShellCommand::new("rm x", "", RiskTier::Danger);
        assert_eq!(command.with_minimum_risk(RiskTier::Caution).risk, RiskTier::Danger);
        let command = ShellCommand::new("rm x", "", RiskTier::Safe);
        assert_eq!(command.with_minimum_risk(RiskTier::Caution).risk, RiskTier::Caution);
    }
}
