//! Editor configuration
//!
//! `editor.toml` supplies defaults for the server connection, the save quiet
//! period and the bulk export failure policy. Flags and environment variables
//! override it.

use prelude_common::config::{default_data_folder, resolve_setting, LoggingConfig};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::bulk::FailurePolicy;
use crate::sync::{SessionConfig, DEFAULT_QUIET_PERIOD};

pub const CONFIG_FILE_NAME: &str = "editor.toml";
pub const SERVER_URL_ENV: &str = "PRELUDE_SERVER_URL";
pub const TOKEN_ENV: &str = "PRELUDE_TOKEN";
pub const SAVE_DEBOUNCE_ENV: &str = "PRELUDE_SAVE_DEBOUNCE_MS";
pub const BULK_POLICY_ENV: &str = "PRELUDE_BULK_POLICY";
pub const EXPORT_DIR_ENV: &str = "PRELUDE_EXPORT_DIR";

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

/// Contents of `editor.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorToml {
    pub server_url: Option<String>,
    pub api_token: Option<String>,
    pub save_debounce_ms: Option<u64>,
    pub bulk_failure_policy: Option<FailurePolicy>,
    pub export_dir: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub server_url: Option<String>,
    pub token: Option<String>,
    pub bulk_policy: Option<FailurePolicy>,
    pub export_dir: Option<PathBuf>,
}

/// Fully resolved editor settings
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSettings {
    pub server_url: String,
    pub api_token: Option<String>,
    pub save_quiet_period: Duration,
    pub bulk_policy: FailurePolicy,
    pub export_dir: PathBuf,
    pub log_level: String,
}

impl EditorSettings {
    pub fn resolve(cli: CliOverrides, toml: EditorToml) -> Self {
        let server_url = resolve_setting(
            cli.server_url,
            SERVER_URL_ENV,
            toml.server_url,
            DEFAULT_SERVER_URL.to_string(),
        );
        let token = resolve_setting(cli.token, TOKEN_ENV, toml.api_token, String::new());
        let debounce_ms = resolve_setting(
            None,
            SAVE_DEBOUNCE_ENV,
            toml.save_debounce_ms,
            DEFAULT_QUIET_PERIOD.as_millis() as u64,
        );
        let bulk_policy = resolve_setting(
            cli.bulk_policy,
            BULK_POLICY_ENV,
            toml.bulk_failure_policy,
            FailurePolicy::default(),
        );
        let export_dir = resolve_setting(
            cli.export_dir,
            EXPORT_DIR_ENV,
            toml.export_dir,
            default_data_folder().join("exports"),
        );

        Self {
            server_url,
            api_token: Some(token).filter(|t| !t.is_empty()),
            save_quiet_period: Duration::from_millis(debounce_ms),
            bulk_policy,
            export_dir,
            log_level: toml.logging.level,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            save_quiet_period: self.save_quiet_period,
        }
    }
}
