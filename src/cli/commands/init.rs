//! Init command implementation
//!
//! This module implements the `init` command for provisioning the census
//! storage schema. Schema changes are owned here, at the operator boundary;
//! the ingestion core never creates or alters tables.

use crate::adapters::postgresql::PostgresClient;
use crate::config::{load_config, StorageBackend};
use clap::Args;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Initializing census storage");

        println!("📝 Initializing census storage");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        match config.storage.backend {
            StorageBackend::Memory => {
                println!("✅ Memory backend requires no initialization");
                Ok(0)
            }
            StorageBackend::Postgresql => {
                let pg_config = match config.storage.postgresql {
                    Some(c) => c,
                    None => {
                        println!("❌ storage.postgresql section is missing");
                        return Ok(2);
                    }
                };

                let client = match PostgresClient::new(pg_config) {
                    Ok(c) => c,
                    Err(e) => {
                        println!("❌ Failed to configure PostgreSQL client: {e}");
                        return Ok(2);
                    }
                };

                println!("Connecting to {}", client.dsn_redacted());

                match client.ensure_schema().await {
                    Ok(()) => {
                        println!("✅ Schema applied: hospital_census is ready");
                        println!();
                        println!("Next steps:");
                        println!("  1. Validate configuration: census validate-config");
                        println!("  2. Ingest messages: census ingest <file.hl7>");
                        println!();
                        Ok(0)
                    }
                    Err(e) => {
                        println!("❌ Failed to apply schema");
                        println!("   Error: {e}");
                        Ok(4)
                    }
                }
            }
        }
    }
}
