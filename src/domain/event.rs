//! Canonical patient-location event
//!
//! A [`CensusEvent`] is the extractor's output: one ADT message reduced to the
//! fields the census cares about. Events are immutable once constructed.

use crate::domain::ids::{ControlId, Mrn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Logical timestamp of an event
///
/// Wraps the instant the event is ordered by, plus a flag recording whether it
/// came from the message itself (MSH-7) or from the ingestion clock. Only
/// message-derived timestamps participate in stale-event detection: a fallback
/// clock value says nothing about the sender's ordering, so it must never
/// cause an event to be discarded as superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedAt {
    /// The instant the event is ordered by
    pub at: DateTime<Utc>,

    /// True when `at` came from the message timestamp, false when it is the
    /// ingestion-time fallback
    pub ordered: bool,
}

impl ObservedAt {
    /// An ordered timestamp taken from the message itself
    pub fn from_message(at: DateTime<Utc>) -> Self {
        Self { at, ordered: true }
    }

    /// An unordered fallback timestamp taken from the ingestion clock
    pub fn fallback(at: DateTime<Utc>) -> Self {
        Self { at, ordered: false }
    }
}

/// Canonical census event extracted from one ADT message
///
/// Immutable once constructed; the reconciler reads it but never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CensusEvent {
    /// Patient identity key
    pub mrn: Mrn,

    /// Display name, given name followed by family name
    pub patient_name: String,

    /// Date of birth, preserved as the raw PID-7 string
    pub dob: String,

    /// Assigned point of care from PV1-3
    pub unit: String,

    /// Message control ID (MSH-10), the deduplication key
    pub control_id: ControlId,

    /// Logical timestamp of the event
    pub observed_at: ObservedAt,
}
