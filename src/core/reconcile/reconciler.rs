//! Census reconciler
//!
//! The reconciler owns the engine's one critical section: the per-MRN
//! read-modify-write against the census store. Redelivery and out-of-order
//! transport are assumed, not exceptional, so the policy is last-writer-wins
//! by *event* time, never by arrival time:
//!
//! 1. Look up the record by MRN; absent means create.
//! 2. Same control ID as the stored record means a redelivered message:
//!    ignore without mutating (idempotence).
//! 3. A strictly older event time, when both sides carry real message
//!    timestamps, means a late stale event: ignore without mutating.
//! 4. Otherwise overwrite every event-carried field atomically.
//!
//! Serialization is per MRN via optimistic compare-and-swap against the
//! stored control ID, not a global lock: a concurrent writer racing on the
//! same MRN surfaces as a CAS conflict and the whole sequence re-executes.

use crate::adapters::storage::traits::{CensusStore, UpsertOutcome};
use crate::domain::errors::StorageError;
use crate::domain::event::CensusEvent;
use crate::domain::record::CensusRecord;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of applying one event to the census
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcileOutcome {
    /// The event mutated the census (created or overwrote the record)
    Applied,

    /// Redelivery of the already-applied control ID; no mutation
    DuplicateIgnored,

    /// The event is older than the stored state; no mutation
    SupersededIgnored,
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReconcileOutcome::Applied => "applied",
            ReconcileOutcome::DuplicateIgnored => "duplicate_ignored",
            ReconcileOutcome::SupersededIgnored => "superseded_ignored",
        };
        write!(f, "{s}")
    }
}

/// Tuning for the reconciler's storage interaction
#[derive(Debug, Clone, Copy)]
pub struct ReconcilePolicy {
    /// Timeout applied to every individual storage call
    pub storage_timeout: Duration,

    /// How many times the full compare-and-swap sequence is re-executed
    /// after a write conflict before giving up
    pub max_attempts: usize,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            storage_timeout: Duration::from_secs(5),
            max_attempts: 3,
        }
    }
}

/// Applies census events to the backing store
///
/// Cheap to clone behind `Arc`; safe for concurrent use from many tasks.
pub struct Reconciler {
    store: Arc<dyn CensusStore>,
    policy: ReconcilePolicy,
}

impl Reconciler {
    /// Create a new reconciler over a census store
    pub fn new(store: Arc<dyn CensusStore>, policy: ReconcilePolicy) -> Self {
        Self { store, policy }
    }

    /// Applies one event to the census
    ///
    /// Re-runs the full read-modify-write on CAS conflict, up to the policy's
    /// attempt budget. A conflict is never silently dropped or merged.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Timeout`] when a storage call exceeds the
    /// configured timeout, [`StorageError::Conflict`] when the retry budget
    /// is exhausted, and passes through backend connection/query failures.
    pub async fn apply(&self, event: &CensusEvent) -> Result<ReconcileOutcome, StorageError> {
        for attempt in 1..=self.policy.max_attempts {
            if let Some(outcome) = self.try_apply(event).await? {
                return Ok(outcome);
            }
            tracing::debug!(
                mrn = %event.mrn,
                control_id = %event.control_id,
                attempt,
                "Write conflict, re-running reconcile sequence"
            );
        }

        Err(StorageError::Conflict(event.mrn.as_str().to_string()))
    }

    /// One pass of the compare-and-swap sequence
    ///
    /// `Ok(None)` means the CAS lost a race and the caller should retry.
    async fn try_apply(
        &self,
        event: &CensusEvent,
    ) -> Result<Option<ReconcileOutcome>, StorageError> {
        let existing = self.timed(self.store.get_by_mrn(&event.mrn)).await??;

        let (record, expected_prior) = match existing {
            None => (CensusRecord::from_event(event), None),
            Some(current) => {
                if event.control_id == current.last_event_control_id {
                    return Ok(Some(ReconcileOutcome::DuplicateIgnored));
                }

                // Stale only when both sides carry real message timestamps;
                // fallback clock values say nothing about sender ordering.
                if event.observed_at.ordered
                    && current.last_event_ordered
                    && event.observed_at.at < current.last_updated
                {
                    return Ok(Some(ReconcileOutcome::SupersededIgnored));
                }

                let prior = current.last_event_control_id.clone();
                (current.with_event(event), Some(prior))
            }
        };

        let outcome = self
            .timed(self.store.create_or_update(&record, expected_prior.as_ref()))
            .await??;

        match outcome {
            UpsertOutcome::Stored => Ok(Some(ReconcileOutcome::Applied)),
            UpsertOutcome::Conflict => Ok(None),
        }
    }

    /// Wraps a storage call in the policy timeout
    async fn timed<T>(
        &self,
        fut: impl Future<Output = T>,
    ) -> Result<T, StorageError> {
        tokio::time::timeout(self.policy.storage_timeout, fut)
            .await
            .map_err(|_| StorageError::Timeout(self.policy.storage_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::memory::InMemoryCensusStore;
    use crate::domain::event::ObservedAt;
    use crate::domain::ids::{ControlId, Mrn};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 1, hour, 0, 0).unwrap()
    }

    fn event(control_id: &str, unit: &str, observed: ObservedAt) -> CensusEvent {
        CensusEvent {
            mrn: Mrn::new("PAT999").unwrap(),
            patient_name: "JOHN DOE".to_string(),
            dob: "19700101".to_string(),
            unit: unit.to_string(),
            control_id: ControlId::new(control_id).unwrap(),
            observed_at: observed,
        }
    }

    fn reconciler(store: Arc<dyn CensusStore>) -> Reconciler {
        Reconciler::new(store, ReconcilePolicy::default())
    }

    #[tokio::test]
    async fn test_first_event_creates_record() {
        let store = Arc::new(InMemoryCensusStore::new());
        let r = reconciler(store.clone());

        let e = event("MSG001", "ICU", ObservedAt::from_message(at(10)));
        assert_eq!(r.apply(&e).await.unwrap(), ReconcileOutcome::Applied);

        let record = store.get_by_mrn(&e.mrn).await.unwrap().unwrap();
        assert_eq!(record.unit, "ICU");
        assert_eq!(record.last_event_control_id.as_str(), "MSG001");
    }

    #[tokio::test]
    async fn test_redelivery_is_idempotent() {
        let store = Arc::new(InMemoryCensusStore::new());
        let r = reconciler(store.clone());

        let e = event("MSG001", "ICU", ObservedAt::from_message(at(10)));
        assert_eq!(r.apply(&e).await.unwrap(), ReconcileOutcome::Applied);
        let after_first = store.get_by_mrn(&e.mrn).await.unwrap().unwrap();

        assert_eq!(
            r.apply(&e).await.unwrap(),
            ReconcileOutcome::DuplicateIgnored
        );
        let after_second = store.get_by_mrn(&e.mrn).await.unwrap().unwrap();
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_stale_event_never_overwrites() {
        let store = Arc::new(InMemoryCensusStore::new());
        let r = reconciler(store.clone());

        let newer = event("MSG002", "WARD3", ObservedAt::from_message(at(12)));
        let older = event("MSG001", "ICU", ObservedAt::from_message(at(10)));

        assert_eq!(r.apply(&newer).await.unwrap(), ReconcileOutcome::Applied);
        assert_eq!(
            r.apply(&older).await.unwrap(),
            ReconcileOutcome::SupersededIgnored
        );

        let record = store.get_by_mrn(&newer.mrn).await.unwrap().unwrap();
        assert_eq!(record.unit, "WARD3");
        assert_eq!(record.last_event_control_id.as_str(), "MSG002");
    }

    #[tokio::test]
    async fn test_order_independent_convergence() {
        let e1 = event("MSG001", "ICU", ObservedAt::from_message(at(10)));
        let e2 = event("MSG002", "WARD3", ObservedAt::from_message(at(12)));

        let forward = Arc::new(InMemoryCensusStore::new());
        let r = reconciler(forward.clone());
        r.apply(&e1).await.unwrap();
        r.apply(&e2).await.unwrap();

        let reverse = Arc::new(InMemoryCensusStore::new());
        let r = reconciler(reverse.clone());
        r.apply(&e2).await.unwrap();
        r.apply(&e1).await.unwrap();

        let a = forward.get_by_mrn(&e1.mrn).await.unwrap().unwrap();
        let b = reverse.get_by_mrn(&e1.mrn).await.unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.unit, "WARD3");
    }

    #[tokio::test]
    async fn test_fallback_timestamps_do_not_supersede() {
        let store = Arc::new(InMemoryCensusStore::new());
        let r = reconciler(store.clone());

        let first = event("MSG001", "ICU", ObservedAt::from_message(at(12)));
        // Arrived later with no message timestamp; its fallback clock reads
        // earlier than the stored event time but must still apply.
        let second = event("MSG002", "WARD3", ObservedAt::fallback(at(10)));

        assert_eq!(r.apply(&first).await.unwrap(), ReconcileOutcome::Applied);
        assert_eq!(r.apply(&second).await.unwrap(), ReconcileOutcome::Applied);
        let record = store.get_by_mrn(&first.mrn).await.unwrap().unwrap();
        assert_eq!(record.unit, "WARD3");
    }

    #[tokio::test]
    async fn test_equal_timestamps_apply() {
        let store = Arc::new(InMemoryCensusStore::new());
        let r = reconciler(store.clone());

        let first = event("MSG001", "ICU", ObservedAt::from_message(at(10)));
        let second = event("MSG002", "WARD3", ObservedAt::from_message(at(10)));

        r.apply(&first).await.unwrap();
        assert_eq!(r.apply(&second).await.unwrap(), ReconcileOutcome::Applied);
    }

    /// Store whose reads never return within any reasonable deadline
    struct StalledStore;

    #[async_trait]
    impl CensusStore for StalledStore {
        async fn get_by_mrn(&self, _mrn: &Mrn) -> Result<Option<CensusRecord>, StorageError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn create_or_update(
            &self,
            _record: &CensusRecord,
            _expected_prior_control_id: Option<&ControlId>,
        ) -> Result<UpsertOutcome, StorageError> {
            Ok(UpsertOutcome::Stored)
        }
    }

    #[tokio::test]
    async fn test_slow_storage_surfaces_timeout() {
        let policy = ReconcilePolicy {
            storage_timeout: Duration::from_millis(10),
            max_attempts: 3,
        };
        let r = Reconciler::new(Arc::new(StalledStore), policy);

        let e = event("MSG001", "ICU", ObservedAt::from_message(at(10)));
        let err = r.apply(&e).await.unwrap_err();
        assert!(matches!(err, StorageError::Timeout(d) if d == Duration::from_millis(10)));
        assert!(err.is_retryable());
    }

    /// Store that reports a CAS conflict for the first N writes
    struct FlakyStore {
        inner: InMemoryCensusStore,
        conflicts_left: AtomicUsize,
    }

    #[async_trait]
    impl CensusStore for FlakyStore {
        async fn get_by_mrn(&self, mrn: &Mrn) -> Result<Option<CensusRecord>, StorageError> {
            self.inner.get_by_mrn(mrn).await
        }

        async fn create_or_update(
            &self,
            record: &CensusRecord,
            expected_prior_control_id: Option<&ControlId>,
        ) -> Result<UpsertOutcome, StorageError> {
            if self.conflicts_left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                n.checked_sub(1)
            })
            .is_ok()
            {
                return Ok(UpsertOutcome::Conflict);
            }
            self.inner
                .create_or_update(record, expected_prior_control_id)
                .await
        }
    }

    #[tokio::test]
    async fn test_conflict_retries_full_sequence() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryCensusStore::new(),
            conflicts_left: AtomicUsize::new(2),
        });
        let r = reconciler(store.clone());

        let e = event("MSG001", "ICU", ObservedAt::from_message(at(10)));
        assert_eq!(r.apply(&e).await.unwrap(), ReconcileOutcome::Applied);
    }

    #[tokio::test]
    async fn test_conflict_budget_exhaustion_surfaces() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryCensusStore::new(),
            conflicts_left: AtomicUsize::new(usize::MAX),
        });
        let r = reconciler(store);

        let e = event("MSG001", "ICU", ObservedAt::from_message(at(10)));
        let err = r.apply(&e).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
        assert!(err.is_retryable());
    }
}
