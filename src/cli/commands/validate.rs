//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the census configuration file.

use crate::config::load_config;
use crate::config::StorageBackend;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Application: {}", config.application.name);
        println!("  Log Level: {}", config.application.log_level);

        match config.storage.backend {
            StorageBackend::Memory => {
                println!("  Storage Backend: memory");
            }
            StorageBackend::Postgresql => {
                println!("  Storage Backend: postgresql");
                if let Some(ref pg) = config.storage.postgresql {
                    println!("  PostgreSQL Host: {}:{}", pg.host, pg.port);
                    println!("  PostgreSQL Database: {}", pg.dbname);
                    println!("  Max Connections: {}", pg.max_connections);
                }
            }
        }

        println!("  Storage Timeout: {} ms", config.storage.timeout_ms);
        println!("  Max Attempts: {}", config.storage.max_attempts);
        println!(
            "  File Logging: {}",
            if config.logging.local_enabled {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!();

        Ok(0)
    }
}
