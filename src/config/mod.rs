//! Configuration management
//!
//! TOML configuration with `${VAR}` environment substitution and `CENSUS_*`
//! overrides. The original deployment loaded credentials into module-level
//! globals at import time; here everything is an explicitly constructed
//! [`CensusConfig`] handed to whoever needs it.

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, CensusConfig, LoggingConfig, PostgresConfig, StorageBackend, StorageConfig,
};
