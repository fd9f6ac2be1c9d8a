//! shai configuration module
//!
//! Loads `~/.config/shai/config.yaml`, validates provider/model
//! cross-references and expands `${ENV_VAR}` secrets. The resolved result is
//! published once per process through [`init_global`].

pub mod api_keys;
pub mod constants;
pub mod loader;
pub mod types;

pub use api_keys::{MissingSecretError, expand_env_refs, load_dotenv};
pub use loader::{ConfigError, ConfigManager, ResolvedConfig};
pub use types::{Language, ModelConfig, ProviderConfig, ShaiConfig};

use once_cell::sync::OnceCell;

static GLOBAL: OnceCell<ResolvedConfig> = OnceCell::new();

/// Publish the resolved configuration for the rest of the process.
///
/// The first call wins; later calls return the already published value.
pub fn init_global(config: ResolvedConfig) -> &'static ResolvedConfig {
    GLOBAL.get_or_init(move || config)
}
