//! PostgreSQL census store
//!
//! Implements [`CensusStore`] against the `hospital_census` table. The MRN is
//! the primary key, so a racing create hits the unique constraint and reads
//! back as a conflict; conditional updates guard on the stored control ID so
//! the reconciler's compare-and-swap holds across processes, not just tasks.

use crate::adapters::postgresql::client::PostgresClient;
use crate::adapters::storage::traits::{CensusStore, UpsertOutcome};
use crate::domain::errors::StorageError;
use crate::domain::ids::{ControlId, Mrn};
use crate::domain::record::CensusRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_postgres::Row;

const SELECT_BY_MRN: &str = "\
    SELECT mrn, patient_name, dob, current_unit, last_event_control_id, \
           last_updated, last_event_ordered \
    FROM hospital_census WHERE mrn = $1";

const INSERT_IF_ABSENT: &str = "\
    INSERT INTO hospital_census \
        (mrn, patient_name, dob, current_unit, last_event_control_id, \
         last_updated, last_event_ordered) \
    VALUES ($1, $2, $3, $4, $5, $6, $7) \
    ON CONFLICT (mrn) DO NOTHING";

const UPDATE_IF_UNCHANGED: &str = "\
    UPDATE hospital_census \
    SET patient_name = $2, dob = $3, current_unit = $4, \
        last_event_control_id = $5, last_updated = $6, last_event_ordered = $7 \
    WHERE mrn = $1 AND last_event_control_id = $8";

/// Census store backed by PostgreSQL
pub struct PostgresCensusStore {
    client: Arc<PostgresClient>,
}

impl PostgresCensusStore {
    /// Create a store over an existing client
    pub fn new(client: Arc<PostgresClient>) -> Self {
        Self { client }
    }

    /// The underlying client
    pub fn client(&self) -> &Arc<PostgresClient> {
        &self.client
    }
}

#[async_trait]
impl CensusStore for PostgresCensusStore {
    async fn get_by_mrn(&self, mrn: &Mrn) -> Result<Option<CensusRecord>, StorageError> {
        let row = self
            .client
            .query_opt(SELECT_BY_MRN, &[&mrn.as_str()])
            .await?;

        row.map(record_from_row).transpose()
    }

    async fn create_or_update(
        &self,
        record: &CensusRecord,
        expected_prior_control_id: Option<&ControlId>,
    ) -> Result<UpsertOutcome, StorageError> {
        let affected = match expected_prior_control_id {
            None => {
                self.client
                    .execute(
                        INSERT_IF_ABSENT,
                        &[
                            &record.mrn.as_str(),
                            &record.patient_name,
                            &record.dob,
                            &record.unit,
                            &record.last_event_control_id.as_str(),
                            &record.last_updated,
                            &record.last_event_ordered,
                        ],
                    )
                    .await?
            }
            Some(expected) => {
                self.client
                    .execute(
                        UPDATE_IF_UNCHANGED,
                        &[
                            &record.mrn.as_str(),
                            &record.patient_name,
                            &record.dob,
                            &record.unit,
                            &record.last_event_control_id.as_str(),
                            &record.last_updated,
                            &record.last_event_ordered,
                            &expected.as_str(),
                        ],
                    )
                    .await?
            }
        };

        if affected == 1 {
            Ok(UpsertOutcome::Stored)
        } else {
            Ok(UpsertOutcome::Conflict)
        }
    }
}

fn record_from_row(row: Row) -> Result<CensusRecord, StorageError> {
    let mrn: String = row.get("mrn");
    let control_id: String = row.get("last_event_control_id");
    let last_updated: DateTime<Utc> = row.get("last_updated");

    Ok(CensusRecord {
        mrn: Mrn::new(mrn).map_err(|e| StorageError::Query(format!("corrupt row: {e}")))?,
        patient_name: row.get("patient_name"),
        dob: row.get("dob"),
        unit: row.get("current_unit"),
        last_event_control_id: ControlId::new(control_id)
            .map_err(|e| StorageError::Query(format!("corrupt row: {e}")))?,
        last_updated,
        last_event_ordered: row.get("last_event_ordered"),
    })
}
