//! Census storage abstraction
//!
//! The trait every census backend implements. Backends must keep the MRN
//! unique at the storage layer (a unique constraint, not application-level
//! checking) so that two writers racing to create the same patient surface
//! as a conflict rather than a duplicate row.

use crate::domain::errors::StorageError;
use crate::domain::ids::{ControlId, Mrn};
use crate::domain::record::CensusRecord;
use async_trait::async_trait;

/// Result of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The record was written
    Stored,

    /// The precondition failed: the record appeared (create) or its control
    /// ID moved (update) between the caller's read and this write
    Conflict,
}

/// Storage collaborator for the persisted census
///
/// `create_or_update` is a compare-and-swap:
/// - `expected_prior_control_id == None` asserts the MRN does not exist yet
///   (create); an existing row is a `Conflict`.
/// - `Some(id)` asserts the stored row still carries that control ID
///   (update); anything else is a `Conflict`.
///
/// Timeouts are the caller's concern; implementations should not block
/// indefinitely, but the reconciler wraps every call in its own deadline.
#[async_trait]
pub trait CensusStore: Send + Sync {
    /// Look up the census record for an MRN
    ///
    /// # Errors
    ///
    /// Returns an error only for backend failures, not for absence.
    async fn get_by_mrn(&self, mrn: &Mrn) -> Result<Option<CensusRecord>, StorageError>;

    /// Conditionally create or overwrite a census record
    ///
    /// The write is atomic: either every field of `record` is persisted or
    /// none are.
    ///
    /// # Errors
    ///
    /// Returns an error for backend failures; precondition failures are the
    /// `Conflict` outcome, not an error.
    async fn create_or_update(
        &self,
        record: &CensusRecord,
        expected_prior_control_id: Option<&ControlId>,
    ) -> Result<UpsertOutcome, StorageError>;
}
