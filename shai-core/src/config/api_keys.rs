//! Secret resolution for configuration values.
//!
//! Provider credentials in `config.yaml` may be written literally or as
//! `${NAME}` references. References are substituted from the process
//! environment when the configuration is loaded; an unset variable is a
//! [`MissingSecretError`] naming the variable.
//!
//! Lookups go through a caller-supplied function so the loader can be
//! exercised without touching the real environment.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::env;
use thiserror::Error;
use tracing::{debug, warn};

/// A `${NAME}` reference whose variable is not set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("environment variable `{name}` is not defined")]
pub struct MissingSecretError {
    pub name: String,
}

#[allow(clippy::unwrap_used)]
static ENV_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Read a variable from the real process environment.
///
/// Empty values count as unset, a blank API key is never useful.
pub fn process_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// Replace every `${NAME}` in `value` using `lookup`.
///
/// The first unresolved reference aborts expansion. Text outside references
/// is kept verbatim, so `Bearer ${TOKEN}` expands to `Bearer <token>`.
pub fn expand_env_refs<F>(value: &str, lookup: F) -> Result<String, MissingSecretError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing: Option<String> = None;
    let expanded = ENV_REFERENCE.replace_all(value, |caps: &Captures<'_>| {
        let name = &caps[1];
        match lookup(name) {
            Some(resolved) => {
                debug!(var = name, "resolved environment reference");
                resolved
            }
            None => {
                if missing.is_none() {
                    missing = Some(name.to_string());
                }
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(MissingSecretError { name }),
        None => Ok(expanded.into_owned()),
    }
}

/// Load environment variables from a `.env` file in the working directory.
///
/// A missing file is not an error; a malformed one is logged and skipped.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded environment variables"),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(error = %e, "failed to load .env file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn expands_whole_value_reference() {
        let lookup = env_of(&[("DEEPSEEK_API_KEY", "abc123")]);
        assert_eq!(
            expand_env_refs("${DEEPSEEK_API_KEY}", lookup).unwrap(),
            "abc123"
        );
    }

    #[test]
    fn expands_embedded_references() {
        let lookup = env_of(&[("HOST", "localhost"), ("PORT", "8080")]);
        assert_eq!(
            expand_env_refs("http://${HOST}:${PORT}/v1", lookup).unwrap(),
            "http://localhost:8080/v1"
        );
    }

    #[test]
    fn literal_values_pass_through() {
        let lookup = env_of(&[]);
        assert_eq!(expand_env_refs("sk-literal", lookup).unwrap(), "sk-literal");
        // Not a reference: no braces.
        let lookup = env_of(&[]);
        assert_eq!(expand_env_refs("$NOT_A_REF", lookup).unwrap(), "$NOT_A_REF");
    }

    #[test]
    fn reports_first_missing_variable() {
        let lookup = env_of(&[("SET", "x")]);
        let err = expand_env_refs("${SET}${UNSET_ONE}${UNSET_TWO}", lookup).unwrap_err();
        assert_eq!(err.name, "UNSET_ONE");
        assert!(err.to_string().contains("UNSET_ONE"));
    }
}
