//! # Broker Configuration
//!
//! Administrative connection parameters and server settings. Loaded once at
//! startup from an optional TOML file, then overridden from the environment,
//! and handed to the controller at construction time.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{BrokerError, BrokerResult};
use crate::config_validator::ConfigValidator;
use crate::observability::LogFormat;

pub const ENV_HOST: &str = "MARIADB_HOST";
pub const ENV_PORT: &str = "MARIADB_PORT";
pub const ENV_USER: &str = "MARIADB_USER";
pub const ENV_PASS: &str = "MARIADB_PASS";

/// Operator-level credentials for the backing server
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Backing server host, also handed out in bind credentials
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Host part of the accounts created for instances
    #[serde(default = "default_user_host")]
    pub user_host: String,

    /// Limit on establishing the administrative connection
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    3306
}
fn default_username() -> String {
    "root".to_string()
}
fn default_user_host() -> String {
    "%".to_string()
}
fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_username(),
            password: String::new(),
            user_host: default_user_host(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("user_host", &self.user_host)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Broker configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// HTTP port of the broker API
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Stop serving after a failed create so the supervisor restarts the broker
    #[serde(default = "default_halt_on_provisioning_failure")]
    pub halt_on_provisioning_failure: bool,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default)]
    pub admin: AdminConfig,
}

fn default_listen_port() -> u16 {
    8005
}
fn default_halt_on_provisioning_failure() -> bool {
    true
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            halt_on_provisioning_failure: default_halt_on_provisioning_failure(),
            log_format: LogFormat::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl BrokerConfig {
    /// Load configuration: file (if any), then environment.
    ///
    /// Not validated, so callers can layer further overrides before calling
    /// [`BrokerConfig::validate`].
    pub fn load(path: Option<&Path>) -> BrokerResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> BrokerResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| BrokerError::ConfigError {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| BrokerError::ConfigError {
            message: format!("Invalid config {}: {}", path.display(), e),
        })
    }

    /// Override administrative settings from environment variables
    pub fn apply_env<F>(&mut self, lookup: F) -> BrokerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.admin.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.admin.port = port.trim().parse().map_err(|_| BrokerError::ConfigError {
                message: format!("{} is not a valid port: {}", ENV_PORT, port),
            })?;
        }
        if let Some(username) = lookup(ENV_USER) {
            self.admin.username = username;
        }
        if let Some(password) = lookup(ENV_PASS) {
            self.admin.password = password;
        }
        Ok(())
    }

    /// Validate all settings, reporting every problem together
    pub fn validate(&self) -> BrokerResult<()> {
        let mut validator = ConfigValidator::new();
        validator
            .validate_port("listen_port", self.listen_port)
            .validate_non_empty("admin.host", &self.admin.host)
            .validate_host("admin.host", &self.admin.host)
            .validate_port("admin.port", self.admin.port)
            .validate_non_empty("admin.username", &self.admin.username)
            .validate_non_empty("admin.user_host", &self.admin.user_host)
            .validate_account_host("admin.user_host", &self.admin.user_host)
            .validate_range(
                "admin.connect_timeout_secs",
                i64::try_from(self.admin.connect_timeout_secs).unwrap_or(i64::MAX),
                1,
                300,
            );

        validator.finish().map_err(|errors| BrokerError::ConfigError {
            message: errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })
    }
}
