//! Persisted census record
//!
//! One [`CensusRecord`] per patient, keyed by MRN. Created on the first event
//! for an MRN, overwritten in place on every subsequent accepted event, never
//! deleted by this engine.

use crate::domain::event::CensusEvent;
use crate::domain::ids::{ControlId, Mrn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The persisted "current census" row for one patient
///
/// `unit` reflects the most-recently-*accepted* event for the MRN by event
/// time, which under out-of-order delivery is not necessarily the
/// most-recently-received one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CensusRecord {
    /// Patient identity key, unique at the storage layer
    pub mrn: Mrn,

    /// Display name from the latest accepted event
    pub patient_name: String,

    /// Date of birth, raw string as received
    pub dob: String,

    /// Current assigned unit
    pub unit: String,

    /// Control ID of the latest accepted event; the optimistic-concurrency
    /// token for compare-and-swap updates
    pub last_event_control_id: ControlId,

    /// Logical timestamp of the latest accepted event
    pub last_updated: DateTime<Utc>,

    /// Whether `last_updated` came from a message timestamp rather than the
    /// ingestion-clock fallback
    pub last_event_ordered: bool,
}

impl CensusRecord {
    /// Builds the initial record for an MRN from its first event
    pub fn from_event(event: &CensusEvent) -> Self {
        Self {
            mrn: event.mrn.clone(),
            patient_name: event.patient_name.clone(),
            dob: event.dob.clone(),
            unit: event.unit.clone(),
            last_event_control_id: event.control_id.clone(),
            last_updated: event.observed_at.at,
            last_event_ordered: event.observed_at.ordered,
        }
    }

    /// Returns a copy of this record with the event's fields applied
    ///
    /// All event-carried fields are replaced together; the reconciler persists
    /// the result atomically so a record is never a blend of two events.
    pub fn with_event(&self, event: &CensusEvent) -> Self {
        Self {
            mrn: self.mrn.clone(),
            patient_name: event.patient_name.clone(),
            dob: event.dob.clone(),
            unit: event.unit.clone(),
            last_event_control_id: event.control_id.clone(),
            last_updated: event.observed_at.at,
            last_event_ordered: event.observed_at.ordered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::ObservedAt;
    use chrono::TimeZone;

    fn sample_event(control_id: &str, unit: &str) -> CensusEvent {
        CensusEvent {
            mrn: Mrn::new("PAT999").unwrap(),
            patient_name: "JOHN DOE".to_string(),
            dob: "19700101".to_string(),
            unit: unit.to_string(),
            control_id: ControlId::new(control_id).unwrap(),
            observed_at: ObservedAt::from_message(
                Utc.with_ymd_and_hms(2023, 5, 1, 10, 30, 0).unwrap(),
            ),
        }
    }

    #[test]
    fn test_from_event_copies_all_fields() {
        let event = sample_event("MSG001", "ICU");
        let record = CensusRecord::from_event(&event);
        assert_eq!(record.mrn, event.mrn);
        assert_eq!(record.patient_name, "JOHN DOE");
        assert_eq!(record.dob, "19700101");
        assert_eq!(record.unit, "ICU");
        assert_eq!(record.last_event_control_id, event.control_id);
        assert_eq!(record.last_updated, event.observed_at.at);
        assert!(record.last_event_ordered);
    }

    #[test]
    fn test_with_event_replaces_mutable_fields() {
        let first = sample_event("MSG001", "ICU");
        let record = CensusRecord::from_event(&first);

        let mut second = sample_event("MSG002", "WARD3");
        second.observed_at =
            ObservedAt::from_message(Utc.with_ymd_and_hms(2023, 5, 2, 8, 0, 0).unwrap());

        let updated = record.with_event(&second);
        assert_eq!(updated.mrn, record.mrn);
        assert_eq!(updated.unit, "WARD3");
        assert_eq!(updated.last_event_control_id.as_str(), "MSG002");
        assert_eq!(updated.last_updated, second.observed_at.at);
    }
}
