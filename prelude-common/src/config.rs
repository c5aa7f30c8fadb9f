//! Configuration loading and data folder resolution
//!
//! Bootstrap settings come from a TOML file. Every binary resolves each
//! setting in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing TOML file is not an error: a warning is logged and defaults apply.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the data folder
pub const DATA_FOLDER_ENV: &str = "PRELUDE_DATA_FOLDER";

/// Logging configuration shared by every binary
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default location of a binary's TOML file (`<config dir>/prelude/<file_name>`)
pub fn default_config_path(file_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("prelude").join(file_name))
}

/// Load a TOML config file, falling back to defaults when it does not exist
///
/// A file that exists but cannot be parsed is a configuration error.
pub fn load_toml_or_default<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };

    if !path.exists() {
        warn!("Config file {:?} not found, using defaults", path);
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse TOML {:?}: {}", path, e)))?;

    info!("Loaded configuration from {:?}", path);
    Ok(config)
}

/// Resolve the data folder (database file, default export target)
pub fn resolve_data_folder(cli_arg: Option<&str>, toml_value: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    default_data_folder()
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("prelude"))
        .unwrap_or_else(|| PathBuf::from("./prelude_data"))
}

/// Resolve one setting: CLI value, then environment variable, then TOML, then default
///
/// Environment values that fail to parse are ignored with a warning.
pub fn resolve_setting<T>(cli: Option<T>, env_var_name: &str, toml_value: Option<T>, default: T) -> T
where
    T: std::str::FromStr,
{
    if let Some(value) = cli {
        return value;
    }

    if let Ok(raw) = std::env::var(env_var_name) {
        match raw.parse::<T>() {
            Ok(value) => return value,
            Err(_) => warn!("Ignoring unparsable {}={:?}", env_var_name, raw),
        }
    }

    toml_value.unwrap_or(default)
}

/// Ensure a directory exists, creating it and its parents if needed
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        info!("Created directory {:?}", path);
    }
    Ok(())
}
