//! Per-message ingestion outcomes

use crate::core::reconcile::ReconcileOutcome;
use crate::domain::ids::{ControlId, Mrn};
use serde::Serialize;
use std::fmt;

/// Why a message was rejected before reaching storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectKind {
    /// The bytes could not be decoded into segments and fields
    Malformed,

    /// The message decoded but is not an ADT event
    UnsupportedMessageType,

    /// A required segment (PID, PV1) is absent
    MissingRequiredSegment,

    /// A required field (MRN, control ID) is absent or empty
    MissingRequiredField,
}

impl fmt::Display for RejectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectKind::Malformed => "malformed",
            RejectKind::UnsupportedMessageType => "unsupported_message_type",
            RejectKind::MissingRequiredSegment => "missing_required_segment",
            RejectKind::MissingRequiredField => "missing_required_field",
        };
        write!(f, "{s}")
    }
}

/// Classified outcome of one `ingest` call
///
/// Rejections are terminal per message: redelivering the same bytes will
/// reject the same way, so transports should ack them and route the message
/// to a dead-letter path rather than retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IngestOutcome {
    Applied,
    DuplicateIgnored,
    SupersededIgnored,
    Rejected(RejectKind),
}

impl From<ReconcileOutcome> for IngestOutcome {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::Applied => IngestOutcome::Applied,
            ReconcileOutcome::DuplicateIgnored => IngestOutcome::DuplicateIgnored,
            ReconcileOutcome::SupersededIgnored => IngestOutcome::SupersededIgnored,
        }
    }
}

impl fmt::Display for IngestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestOutcome::Applied => write!(f, "applied"),
            IngestOutcome::DuplicateIgnored => write!(f, "duplicate_ignored"),
            IngestOutcome::SupersededIgnored => write!(f, "superseded_ignored"),
            IngestOutcome::Rejected(kind) => write!(f, "rejected ({kind})"),
        }
    }
}

/// Result of one ingestion call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestResult {
    /// What happened to the message
    pub outcome: IngestOutcome,

    /// Patient identity, known once extraction succeeded
    pub mrn: Option<Mrn>,

    /// Message control ID, known once extraction succeeded
    pub control_id: Option<ControlId>,

    /// Human-readable detail for rejections
    pub detail: Option<String>,
}

impl IngestResult {
    /// Result for an event that went through reconciliation
    pub fn reconciled(outcome: ReconcileOutcome, mrn: Mrn, control_id: ControlId) -> Self {
        Self {
            outcome: outcome.into(),
            mrn: Some(mrn),
            control_id: Some(control_id),
            detail: None,
        }
    }

    /// Result for a message rejected before reconciliation
    pub fn rejected(kind: RejectKind, detail: impl Into<String>) -> Self {
        Self {
            outcome: IngestOutcome::Rejected(kind),
            mrn: None,
            control_id: None,
            detail: Some(detail.into()),
        }
    }

    /// Whether the message was rejected
    pub fn is_rejected(&self) -> bool {
        matches!(self.outcome, IngestOutcome::Rejected(_))
    }
}
