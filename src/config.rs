use crate::error::{Error, Result};
use crate::utils::crypto::DigestAlgorithm;
use serde::{Deserialize, Serialize};
use std::env;
#[cfg(feature = "config")]
use std::fs;
#[cfg(feature = "config")]
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub users: UsersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connections the pool keeps open
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Seconds a connection may sit idle before the pool closes it
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Seconds before a connection is retired
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout: default_connect_timeout(),
            idle_timeout: default_idle_timeout(),
            max_lifetime: default_max_lifetime(),
        }
    }
}

/// Settings of the user model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsersConfig {
    #[serde(default = "default_table")]
    pub table: String,

    /// Role stored when a new user is created without one
    #[serde(default = "default_role")]
    pub default_role: String,

    #[serde(default)]
    pub password_digest: DigestAlgorithm,

    /// Declare `code` UNIQUE when creating the table
    #[serde(default)]
    pub unique_code_constraint: bool,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            default_role: default_role(),
            password_digest: DigestAlgorithm::default(),
            unique_code_constraint: false,
        }
    }
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}
fn default_max_connections() -> u32 {
    5
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    30
}
fn default_idle_timeout() -> u64 {
    600
} // 10 minutes
fn default_max_lifetime() -> u64 {
    1800
} // 30 minutes
fn default_table() -> String {
    "usuarios".to_string()
}
fn default_role() -> String {
    "Usuario".to_string()
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("Invalid {} value: {}", key, value))),
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    #[cfg(feature = "config")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let content = fs::read_to_string(path_ref).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}. Make sure the file exists and is readable.",
                path_ref.display(),
                e
            ))
        })?;

        let config = Self::from_toml_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path_ref.display(),
                e
            ))
        })?;

        log::debug!("Loaded configuration from: {}", path_ref.display());
        Ok(config)
    }

    /// Parse configuration from TOML text; missing keys take their defaults
    #[cfg(feature = "config")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = AppConfig::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `USUARIOS_*` environment variables on top of the current values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Database overrides
        if let Some(url) = lookup("USUARIOS_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(max_conn) = lookup("USUARIOS_DB_MAX_CONNECTIONS") {
            self.database.max_connections = max_conn
                .parse()
                .map_err(|_| Error::config("Invalid USUARIOS_DB_MAX_CONNECTIONS value"))?;
        }

        // User model overrides
        if let Some(table) = lookup("USUARIOS_TABLE") {
            self.users.table = table;
        }
        if let Some(role) = lookup("USUARIOS_DEFAULT_ROLE") {
            self.users.default_role = role;
        }
        if let Some(digest) = lookup("USUARIOS_PASSWORD_DIGEST") {
            self.users.password_digest = digest.parse()?;
        }
        if let Some(unique) = lookup("USUARIOS_UNIQUE_CODE") {
            self.users.unique_code_constraint = parse_flag("USUARIOS_UNIQUE_CODE", &unique)?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(Error::config("Database URL cannot be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(Error::config("Database max_connections cannot be 0"));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(Error::config(
                "Database min_connections cannot exceed max_connections",
            ));
        }
        if self.users.table.trim().is_empty() {
            return Err(Error::config("Users table name cannot be empty"));
        }
        if self.users.default_role.trim().is_empty() {
            return Err(Error::config("Default role cannot be empty"));
        }
        Ok(())
    }
}
