//! Configuration file support for research-aggregator.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `RESEARCH_AGGREGATOR_` (sections are
//! separated by `__`, e.g. `RESEARCH_AGGREGATOR_SEARCH__PAGE_SIZE=20`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:3000"
//!
//! [search]
//! page_size = 10
//! fetch_limit = 50
//!
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//!
//! [sources]
//! enabled = []
//! disabled = ["zenodo"]
//!
//! [api_keys]
//! semantic_scholar = "your-api-key"
//! ncbi = "your-ncbi-key"
//! contact_email = "you@example.org"
//! ```

use std::path::{Path, PathBuf};

use super::{Config, ENV_PREFIX};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "research-aggregator.toml";

/// Load configuration, layering defaults, an optional file and the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigFileError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigFileError::NotFound(path.to_path_buf()));
        }
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Locate a configuration file in the default locations
///
/// Checks `./research-aggregator.toml`, then
/// `<config dir>/research-aggregator/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
        .filter(|path| path.is_file())
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
