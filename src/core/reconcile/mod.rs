//! Census reconciliation
//!
//! Applies canonical events to the persisted census with idempotence and
//! last-writer-wins-by-event-time conflict resolution.

pub mod reconciler;

pub use reconciler::{ReconcileOutcome, ReconcilePolicy, Reconciler};
