//! Configuration schema
//!
//! Everything the engine needs at startup, built once from a TOML file and
//! passed in explicitly. There is no process-wide mutable configuration: the
//! storage handle is constructed from this object and handed to the core.

use crate::core::reconcile::ReconcilePolicy;
use crate::domain::Result;
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CensusConfig {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CensusConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read, parsed, or
    /// validated.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        crate::config::loader::load_config(path)
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns a description of the first violation found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.storage.timeout_ms == 0 {
            return Err("storage.timeout_ms must be greater than zero".to_string());
        }
        if self.storage.max_attempts == 0 {
            return Err("storage.max_attempts must be greater than zero".to_string());
        }
        if self.storage.backend == StorageBackend::Postgresql
            && self.storage.postgresql.is_none()
        {
            return Err(
                "storage.backend is \"postgresql\" but no [storage.postgresql] section is present"
                    .to_string(),
            );
        }
        Ok(())
    }

    /// The reconcile policy derived from the storage section
    pub fn reconcile_policy(&self) -> ReconcilePolicy {
        ReconcilePolicy {
            storage_timeout: Duration::from_millis(self.storage.timeout_ms),
            max_attempts: self.storage.max_attempts,
        }
    }
}

/// Application-level settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

/// Which census backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgresql,
}

/// Storage settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Per-call storage deadline, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Compare-and-swap retry budget per message
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    #[serde(default)]
    pub postgresql: Option<PostgresConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            postgresql: None,
        }
    }
}

/// PostgreSQL connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    pub host: String,

    #[serde(default = "default_pg_port")]
    pub port: u16,

    pub dbname: String,

    pub user: String,

    /// Never logged; wrapped so accidental Debug output stays redacted
    pub password: SecretString,

    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Whether to also write JSON logs to rolling files
    #[serde(default)]
    pub local_enabled: bool,

    #[serde(default = "default_log_path")]
    pub local_path: String,

    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

fn default_app_name() -> String {
    "census".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend() -> StorageBackend {
    StorageBackend::Memory
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> usize {
    3
}

fn default_pg_port() -> u16 {
    5432
}

fn default_max_connections() -> usize {
    8
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}
