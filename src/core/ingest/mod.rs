//! Ingestion coordination
//!
//! The entry point a transport hands raw message bytes to. One
//! [`IngestCoordinator`] per process, shared across connections.

pub mod coordinator;
pub mod outcome;

pub use coordinator::IngestCoordinator;
pub use outcome::{IngestOutcome, IngestResult, RejectKind};
