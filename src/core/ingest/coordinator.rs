//! Ingestion coordinator
//!
//! Drives decode → extract → reconcile for one raw message and reports a
//! classified per-message outcome. Decode and extract failures are caught
//! here and never reach the storage layer; only storage failures escape as
//! errors, already classified for the transport's ack/nack decision.

use crate::adapters::storage::traits::CensusStore;
use crate::core::extract::extract_adt_event;
use crate::core::ingest::outcome::{IngestResult, RejectKind};
use crate::core::reconcile::{ReconcilePolicy, Reconciler};
use crate::domain::errors::{ExtractError, StorageError};
use chrono::Utc;
use std::sync::Arc;

/// Orchestrates ingestion of raw HL7 messages into the census
///
/// Supports concurrent invocation: all methods take `&self`, the decode and
/// extract stages are pure, and per-MRN serialization is handled inside the
/// reconciler. Share one coordinator behind an [`Arc`] across however many
/// connections or consumers the transport runs.
///
/// Cancellation: dropping an in-flight `ingest` future before the storage
/// write commits abandons the message cleanly; once the write has committed
/// the outcome stands; there is no rollback.
pub struct IngestCoordinator {
    reconciler: Reconciler,
}

impl IngestCoordinator {
    /// Create a coordinator over a census store
    pub fn new(store: Arc<dyn CensusStore>, policy: ReconcilePolicy) -> Self {
        Self {
            reconciler: Reconciler::new(store, policy),
        }
    }

    /// Ingest one raw HL7 message
    ///
    /// Reconciliation is all-or-nothing per message: either the census
    /// reflects the whole event or it is untouched.
    ///
    /// # Errors
    ///
    /// Only storage-layer failures surface as `Err`; consult
    /// [`StorageError::is_retryable`] before redelivering. Unparseable or
    /// unsupported messages come back as `Ok` with a
    /// [`Rejected`](crate::core::ingest::IngestOutcome::Rejected) outcome;
    /// they are terminal and should go to a dead-letter path.
    pub async fn ingest(&self, raw: &[u8]) -> Result<IngestResult, StorageError> {
        let received_at = Utc::now();

        let msg = match crate::hl7::decode(raw) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "Rejecting undecodable message");
                return Ok(IngestResult::rejected(RejectKind::Malformed, e.to_string()));
            }
        };

        let event = match extract_adt_event(&msg, received_at) {
            Ok(event) => event,
            Err(e) => {
                let kind = classify_extract_error(&e);
                tracing::warn!(error = %e, kind = %kind, "Rejecting unextractable message");
                return Ok(IngestResult::rejected(kind, e.to_string()));
            }
        };

        let outcome = self.reconciler.apply(&event).await?;

        tracing::info!(
            mrn = %event.mrn,
            control_id = %event.control_id,
            unit = %event.unit,
            outcome = %outcome,
            "Message ingested"
        );

        Ok(IngestResult::reconciled(outcome, event.mrn, event.control_id))
    }
}

fn classify_extract_error(error: &ExtractError) -> RejectKind {
    match error {
        ExtractError::UnsupportedMessageType(_) => RejectKind::UnsupportedMessageType,
        ExtractError::MissingRequiredSegment(_) => RejectKind::MissingRequiredSegment,
        ExtractError::MissingRequiredField(_) => RejectKind::MissingRequiredField,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::memory::InMemoryCensusStore;
    use crate::adapters::storage::traits::UpsertOutcome;
    use crate::core::ingest::outcome::IngestOutcome;
    use crate::domain::ids::{ControlId, Mrn};
    use crate::domain::record::CensusRecord;
    use async_trait::async_trait;

    const ADMIT: &[u8] = b"MSH|^~\\&|EPIC|HOSP|LAB|HOSP|202305011030||ADT^A01|12345|P|2.3\rPID|1||PAT999^^^^MRN||DOE^JOHN||19700101|M\rPV1|1|I|ICU^ROOM10^BED2|||||||||||||||ADMIT";

    fn coordinator() -> (IngestCoordinator, Arc<InMemoryCensusStore>) {
        let store = Arc::new(InMemoryCensusStore::new());
        let coordinator =
            IngestCoordinator::new(store.clone(), ReconcilePolicy::default());
        (coordinator, store)
    }

    #[tokio::test]
    async fn test_admit_message_applies() {
        let (coordinator, store) = coordinator();

        let result = coordinator.ingest(ADMIT).await.unwrap();
        assert_eq!(result.outcome, IngestOutcome::Applied);
        assert_eq!(result.mrn.as_ref().unwrap().as_str(), "PAT999");
        assert_eq!(result.control_id.as_ref().unwrap().as_str(), "12345");

        let mrn = Mrn::new("PAT999").unwrap();
        let record = store.get_by_mrn(&mrn).await.unwrap().unwrap();
        assert_eq!(record.patient_name, "JOHN DOE");
        assert_eq!(record.dob, "19700101");
        assert_eq!(record.unit, "ICU");
    }

    #[tokio::test]
    async fn test_identical_bytes_deduplicate() {
        let (coordinator, store) = coordinator();

        coordinator.ingest(ADMIT).await.unwrap();
        let mrn = Mrn::new("PAT999").unwrap();
        let before = store.get_by_mrn(&mrn).await.unwrap().unwrap();

        let result = coordinator.ingest(ADMIT).await.unwrap();
        assert_eq!(result.outcome, IngestOutcome::DuplicateIgnored);

        let after = store.get_by_mrn(&mrn).await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_garbage_rejected_as_malformed() {
        let (coordinator, store) = coordinator();

        let result = coordinator.ingest(b"not an hl7 message").await.unwrap();
        assert_eq!(
            result.outcome,
            IngestOutcome::Rejected(RejectKind::Malformed)
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_pv1_rejected_before_storage() {
        let (coordinator, store) = coordinator();

        let raw = b"MSH|^~\\&|EPIC|HOSP|LAB|HOSP|202305011030||ADT^A01|777|P|2.3\rPID|1||PAT999^^^^MRN||DOE^JOHN";
        let result = coordinator.ingest(raw).await.unwrap();
        assert_eq!(
            result.outcome,
            IngestOutcome::Rejected(RejectKind::MissingRequiredSegment)
        );
        assert!(result.detail.unwrap().contains("PV1"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_non_adt_rejected() {
        let (coordinator, _) = coordinator();

        let raw = b"MSH|^~\\&|LAB|HOSP|EHR|HOSP|202305011030||ORU^R01|42|P|2.3\rPID|1||PAT999\rPV1|1";
        let result = coordinator.ingest(raw).await.unwrap();
        assert_eq!(
            result.outcome,
            IngestOutcome::Rejected(RejectKind::UnsupportedMessageType)
        );
    }

    #[tokio::test]
    async fn test_out_of_order_transfer_superseded() {
        let (coordinator, store) = coordinator();

        let newer = b"MSH|^~\\&|EPIC|HOSP|LAB|HOSP|202305021200||ADT^A02|T2|P|2.3\rPID|1||PAT999^^^^MRN||DOE^JOHN||19700101\rPV1|1|I|WARD3";
        let older = b"MSH|^~\\&|EPIC|HOSP|LAB|HOSP|202305011030||ADT^A01|T1|P|2.3\rPID|1||PAT999^^^^MRN||DOE^JOHN||19700101\rPV1|1|I|ICU";

        assert_eq!(
            coordinator.ingest(newer).await.unwrap().outcome,
            IngestOutcome::Applied
        );
        assert_eq!(
            coordinator.ingest(older).await.unwrap().outcome,
            IngestOutcome::SupersededIgnored
        );

        let mrn = Mrn::new("PAT999").unwrap();
        let record = store.get_by_mrn(&mrn).await.unwrap().unwrap();
        assert_eq!(record.unit, "WARD3");
    }

    /// Store whose reads park until the gate is released
    struct GatedStore {
        inner: InMemoryCensusStore,
        gate: tokio::sync::Notify,
    }

    #[async_trait]
    impl CensusStore for GatedStore {
        async fn get_by_mrn(&self, mrn: &Mrn) -> Result<Option<CensusRecord>, StorageError> {
            self.gate.notified().await;
            self.inner.get_by_mrn(mrn).await
        }

        async fn create_or_update(
            &self,
            record: &CensusRecord,
            expected_prior_control_id: Option<&ControlId>,
        ) -> Result<UpsertOutcome, StorageError> {
            self.inner
                .create_or_update(record, expected_prior_control_id)
                .await
        }
    }

    #[tokio::test]
    async fn test_dropping_inflight_ingest_leaves_census_untouched() {
        let store = Arc::new(GatedStore {
            inner: InMemoryCensusStore::new(),
            gate: tokio::sync::Notify::new(),
        });
        let coordinator = Arc::new(IngestCoordinator::new(
            store.clone(),
            ReconcilePolicy::default(),
        ));

        let handle = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.ingest(ADMIT).await }
        });

        // Let the task park on the gated storage read, then drop it
        tokio::task::yield_now().await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert!(store.inner.is_empty().await);

        // A run that reaches the commit stands
        store.gate.notify_one();
        let result = coordinator.ingest(ADMIT).await.unwrap();
        assert_eq!(result.outcome, IngestOutcome::Applied);
        assert_eq!(store.inner.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_ingest_converges() {
        let store = Arc::new(InMemoryCensusStore::new());
        // Generous retry budget: 16 writers racing on one MRN can conflict
        // more often than the default allows
        let policy = ReconcilePolicy {
            max_attempts: 64,
            ..ReconcilePolicy::default()
        };
        let coordinator = Arc::new(IngestCoordinator::new(store.clone(), policy));

        let mut handles = Vec::new();
        for i in 0..16 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                let raw = format!(
                    "MSH|^~\\&|EPIC|HOSP|LAB|HOSP|2023050110{:02}||ADT^A02|C{i}|P|2.3\rPID|1||PAT999^^^^MRN||DOE^JOHN||19700101\rPV1|1|I|UNIT{i}",
                    i
                );
                coordinator.ingest(raw.as_bytes()).await.unwrap()
            }));
        }
        for handle in handles {
            assert!(!handle.await.unwrap().is_rejected());
        }

        // Highest event time wins regardless of task interleaving
        let mrn = Mrn::new("PAT999").unwrap();
        let record = store.get_by_mrn(&mrn).await.unwrap().unwrap();
        assert_eq!(record.unit, "UNIT15");
        assert_eq!(record.last_event_control_id.as_str(), "C15");
    }
}
