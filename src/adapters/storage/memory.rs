//! In-memory census store
//!
//! Backend for tests and single-process demo runs. The map lock makes each
//! `create_or_update` atomic, which is exactly the guarantee the trait asks
//! of a real backend's unique constraint plus conditional write.

use crate::adapters::storage::traits::{CensusStore, UpsertOutcome};
use crate::domain::errors::StorageError;
use crate::domain::ids::{ControlId, Mrn};
use crate::domain::record::CensusRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Census store backed by a process-local map
#[derive(Debug, Default)]
pub struct InMemoryCensusStore {
    records: RwLock<HashMap<String, CensusRecord>>,
}

impl InMemoryCensusStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Copy of every record, unordered
    pub async fn snapshot(&self) -> Vec<CensusRecord> {
        self.records.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl CensusStore for InMemoryCensusStore {
    async fn get_by_mrn(&self, mrn: &Mrn) -> Result<Option<CensusRecord>, StorageError> {
        Ok(self.records.read().await.get(mrn.as_str()).cloned())
    }

    async fn create_or_update(
        &self,
        record: &CensusRecord,
        expected_prior_control_id: Option<&ControlId>,
    ) -> Result<UpsertOutcome, StorageError> {
        let mut records = self.records.write().await;
        let key = record.mrn.as_str().to_string();

        match (records.get(&key), expected_prior_control_id) {
            // Create: must not exist yet
            (None, None) => {
                records.insert(key, record.clone());
                Ok(UpsertOutcome::Stored)
            }
            // Update: stored control ID must still match the expectation
            (Some(current), Some(expected)) if &current.last_event_control_id == expected => {
                records.insert(key, record.clone());
                Ok(UpsertOutcome::Stored)
            }
            _ => Ok(UpsertOutcome::Conflict),
        }
    }
}
