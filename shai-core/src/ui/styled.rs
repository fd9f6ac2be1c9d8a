use crate::safety::RiskTier;
use console::{Style, StyledObject, style};
use std::fmt::Display;

/// Style presets for consistent terminal output
pub struct Styles;

impl Styles {
    /// Colour of a command and its tier label
    pub fn risk(tier: RiskTier) -> Style {
        match tier {
            RiskTier::Safe => Style::new().green(),
            RiskTier::Caution => Style::new().yellow(),
            RiskTier::Danger => Style::new().red().bold(),
        }
    }

    pub fn error() -> Style {
        Style::new().red()
    }

    pub fn hint() -> Style {
        Style::new().dim()
    }

    pub fn prompt() -> Style {
        Style::new().cyan().bold()
    }
}

/// `SAFE` / `CAUTION` / `DANGER`, coloured
pub fn risk_label(tier: RiskTier) -> StyledObject<String> {
    Styles::risk(tier).apply_to(tier.to_string())
}

/// Print an error line and an optional hint to stderr
pub fn print_error(label: &str, error: impl Display, hint: Option<&str>) {
    eprintln!("{}", Styles::error().apply_to(format!("{label}: {error}")));
    if let Some(hint) = hint {
        eprintln!("{}", Styles::hint().apply_to(hint));
    }
}

/// `cmd>> ` marker in front of a proposed command
pub fn command_marker() -> StyledObject<&'static str> {
    style("cmd>>").bold()
}
