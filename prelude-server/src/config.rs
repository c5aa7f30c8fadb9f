//! Server configuration
//!
//! `server.toml` supplies the listening port, the database location, the
//! account policy and the seed administrator. Flags and environment
//! variables override it.

use prelude_common::config::{resolve_data_folder, resolve_setting, LoggingConfig};
use serde::Deserialize;
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "server.toml";
pub const PORT_ENV: &str = "PRELUDE_PORT";
pub const BIND_ADDRESS_ENV: &str = "PRELUDE_BIND_ADDRESS";
pub const DATABASE_FILE_ENV: &str = "PRELUDE_DATABASE_FILE";
pub const ALLOW_REGISTRATION_ENV: &str = "PRELUDE_ALLOW_REGISTRATION";
pub const REQUIRE_APPROVAL_ENV: &str = "PRELUDE_REQUIRE_APPROVAL";
pub const ADMIN_EMAIL_ENV: &str = "PRELUDE_ADMIN_EMAIL";
pub const ADMIN_PASSWORD_ENV: &str = "PRELUDE_ADMIN_PASSWORD";
pub const ADMIN_NAME_ENV: &str = "PRELUDE_ADMIN_NAME";

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_DATABASE_FILE: &str = "prelude.db";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "changeme";
pub const DEFAULT_ADMIN_NAME: &str = "Administrator";

/// Contents of `server.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerToml {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub data_folder: Option<PathBuf>,
    pub database_file: Option<String>,
    pub allow_registration: Option<bool>,
    pub require_approval: Option<bool>,
    #[serde(default)]
    pub admin: AdminToml,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[admin]` table: the account created on first start
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminToml {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ServerCli {
    pub port: Option<u16>,
    pub data_folder: Option<String>,
}

/// Self-service account rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountPolicy {
    /// Anyone may create an account through `/api/auth/register`
    pub allow_registration: bool,
    /// Self-registered accounts wait for an administrator before signing in
    pub require_approval: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Fully resolved server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub port: u16,
    pub bind_address: String,
    pub data_folder: PathBuf,
    pub database_file: String,
    pub accounts: AccountPolicy,
    pub seed_admin: SeedAdmin,
    pub log_level: String,
}

impl ServerSettings {
    pub fn resolve(cli: ServerCli, toml: ServerToml) -> Self {
        let data_folder = resolve_data_folder(cli.data_folder.as_deref(), toml.data_folder.as_deref());

        Self {
            port: resolve_setting(cli.port, PORT_ENV, toml.port, DEFAULT_PORT),
            bind_address: resolve_setting(
                None,
                BIND_ADDRESS_ENV,
                toml.bind_address,
                DEFAULT_BIND_ADDRESS.to_string(),
            ),
            data_folder,
            database_file: resolve_setting(
                None,
                DATABASE_FILE_ENV,
                toml.database_file,
                DEFAULT_DATABASE_FILE.to_string(),
            ),
            accounts: AccountPolicy {
                allow_registration: resolve_setting(
                    None,
                    ALLOW_REGISTRATION_ENV,
                    toml.allow_registration,
                    false,
                ),
                require_approval: resolve_setting(
                    None,
                    REQUIRE_APPROVAL_ENV,
                    toml.require_approval,
                    false,
                ),
            },
            seed_admin: SeedAdmin {
                email: resolve_setting(
                    None,
                    ADMIN_EMAIL_ENV,
                    toml.admin.email,
                    DEFAULT_ADMIN_EMAIL.to_string(),
                ),
                password: resolve_setting(
                    None,
                    ADMIN_PASSWORD_ENV,
                    toml.admin.password,
                    DEFAULT_ADMIN_PASSWORD.to_string(),
                ),
                name: resolve_setting(
                    None,
                    ADMIN_NAME_ENV,
                    toml.admin.name,
                    DEFAULT_ADMIN_NAME.to_string(),
                ),
            },
            log_level: toml.logging.level,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_folder.join(&self.database_file)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [
            PORT_ENV,
            BIND_ADDRESS_ENV,
            DATABASE_FILE_ENV,
            ALLOW_REGISTRATION_ENV,
            REQUIRE_APPROVAL_ENV,
            ADMIN_EMAIL_ENV,
            ADMIN_PASSWORD_ENV,
            ADMIN_NAME_ENV,
            prelude_common::config::DATA_FOLDER_ENV,
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let settings = ServerSettings::resolve(ServerCli::default(), ServerToml::default());

        assert_eq!(settings.port, 3001);
        assert_eq!(settings.database_file, "prelude.db");
        assert_eq!(settings.accounts, AccountPolicy::default());
        assert_eq!(settings.seed_admin.email, "admin@example.com");
        assert_eq!(settings.seed_admin.password, "changeme");
        assert_eq!(settings.seed_admin.name, "Administrator");
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    #[serial]
    fn test_cli_beats_env_beats_toml() {
        clear_env();
        let toml: ServerToml = toml::from_str(
            r#"
            port = 4000
            data_folder = "/srv/prelude"
            allow_registration = true

            [admin]
            email = "ops@studio.test"
            "#,
        )
        .unwrap();

        std::env::set_var(PORT_ENV, "5000");
        std::env::set_var(REQUIRE_APPROVAL_ENV, "true");
        let from_env = ServerSettings::resolve(ServerCli::default(), toml.clone());
        assert_eq!(from_env.port, 5000);
        assert!(from_env.accounts.allow_registration);
        assert!(from_env.accounts.require_approval);
        assert_eq!(from_env.seed_admin.email, "ops@studio.test");
        assert_eq!(from_env.database_path(), PathBuf::from("/srv/prelude/prelude.db"));

        let from_cli = ServerSettings::resolve(
            ServerCli {
                port: Some(6000),
                data_folder: Some("/tmp/other".into()),
            },
            toml,
        );
        assert_eq!(from_cli.port, 6000);
        assert_eq!(from_cli.data_folder, PathBuf::from("/tmp/other"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparsable_env_falls_through() {
        clear_env();
        std::env::set_var(PORT_ENV, "not-a-port");
        let settings = ServerSettings::resolve(ServerCli::default(), ServerToml::default());
        assert_eq!(settings.port, DEFAULT_PORT);
        clear_env();
    }
}
