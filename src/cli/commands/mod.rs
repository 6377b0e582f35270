//! Command implementations

pub mod ingest;
pub mod init;
pub mod validate;

use crate::adapters::postgresql::{PostgresCensusStore, PostgresClient};
use crate::adapters::storage::{CensusStore, InMemoryCensusStore};
use crate::config::{CensusConfig, StorageBackend};
use std::sync::Arc;

/// Build the configured census store
///
/// For the PostgreSQL backend the connection is verified up front so that a
/// misconfigured database fails before any message is read.
pub(crate) async fn build_store(config: &CensusConfig) -> anyhow::Result<Arc<dyn CensusStore>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!(backend = "memory", "Using in-memory census store");
            Ok(Arc::new(InMemoryCensusStore::new()))
        }
        StorageBackend::Postgresql => {
            let pg_config = config
                .storage
                .postgresql
                .clone()
                .ok_or_else(|| anyhow::anyhow!("storage.postgresql section is missing"))?;

            let client = Arc::new(PostgresClient::new(pg_config)?);
            tracing::info!(
                backend = "postgresql",
                dsn = %client.dsn_redacted(),
                "Using PostgreSQL census store"
            );

            client.test_connection().await?;

            Ok(Arc::new(PostgresCensusStore::new(client)))
        }
    }
}
