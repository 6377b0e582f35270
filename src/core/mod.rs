//! Business logic: extraction, reconciliation, ingestion coordination

pub mod extract;
pub mod ingest;
pub mod reconcile;

pub use extract::extract_adt_event;
pub use ingest::{IngestCoordinator, IngestOutcome, IngestResult, RejectKind};
pub use reconcile::{ReconcileOutcome, ReconcilePolicy, Reconciler};
