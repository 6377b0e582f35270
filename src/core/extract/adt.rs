//! ADT event extraction
//!
//! Maps a decoded message of type ADT to a canonical [`CensusEvent`]. The
//! mapping is pure: the one external input is the caller's clock, used only
//! when MSH-7 is missing or unparseable.

use crate::domain::errors::ExtractError;
use crate::domain::event::{CensusEvent, ObservedAt};
use crate::domain::ids::{ControlId, Mrn};
use crate::hl7::message::{DecodedMessage, Field};
use crate::hl7::timestamp::parse_hl7_timestamp;
use chrono::{DateTime, Utc};

/// Identifier type code marking the MRN entry in a PID-3 repetition list
const MRN_TYPE_CODE: &str = "MRN";

/// Extracts a census event from a decoded ADT message
///
/// Field mapping:
/// - mrn: the PID-3 repetition typed `MRN`, else the first repetition
/// - patient_name: PID-5 given name, a space, family name
/// - dob: PID-7, raw and format-preserving
/// - unit: PV1-3 point of care
/// - control_id: MSH-10
/// - observed_at: MSH-7, falling back to `received_at` (marked unordered)
///
/// # Errors
///
/// Returns [`ExtractError::UnsupportedMessageType`] when MSH-9 is not an ADT
/// event, [`ExtractError::MissingRequiredSegment`] when PID or PV1 is absent,
/// and [`ExtractError::MissingRequiredField`] when the MRN or control ID is
/// empty.
pub fn extract_adt_event(
    msg: &DecodedMessage,
    received_at: DateTime<Utc>,
) -> Result<CensusEvent, ExtractError> {
    let msh = msg.msh();

    let message_code = msh.field(9).map(|f| f.component(1)).unwrap_or("");
    if message_code != "ADT" {
        return Err(ExtractError::UnsupportedMessageType(message_type_label(
            msg,
        )));
    }

    let control_id = ControlId::new(msh.field_value(10))
        .map_err(|_| ExtractError::MissingRequiredField("MSH-10"))?;

    let observed_at = match parse_hl7_timestamp(msh.field_value(7)) {
        Some(at) => ObservedAt::from_message(at),
        None => ObservedAt::fallback(received_at),
    };

    let pid = msg
        .segment("PID")
        .ok_or(ExtractError::MissingRequiredSegment("PID"))?;
    let pv1 = msg
        .segment("PV1")
        .ok_or(ExtractError::MissingRequiredSegment("PV1"))?;

    let mrn = pid
        .field(3)
        .and_then(select_mrn)
        .and_then(|id| Mrn::new(id).ok())
        .ok_or(ExtractError::MissingRequiredField("PID-3"))?;

    let patient_name = format_patient_name(pid.field(5));
    let dob = pid.field_value(7).to_string();
    let unit = pv1
        .field(3)
        .map(|f| f.component(1))
        .unwrap_or("")
        .to_string();

    Ok(CensusEvent {
        mrn,
        patient_name,
        dob,
        unit,
        control_id,
        observed_at,
    })
}

/// Rebuilds the full MSH-9 value (e.g. `ORU^R01`) for rejection messages
fn message_type_label(msg: &DecodedMessage) -> String {
    let sep = msg.separators().component;
    msg.msh()
        .field(9)
        .and_then(|f| f.repetitions().first())
        .map(|rep| {
            rep.components()
                .iter()
                .map(|c| c.value())
                .collect::<Vec<_>>()
                .join(&sep.to_string())
        })
        .unwrap_or_default()
}

/// Picks the patient identifier out of a (possibly repeated) PID-3
///
/// A patient routinely carries several identifiers: encounter numbers,
/// account numbers, the MRN. The MRN is found by its identifier type code,
/// not by position; only when no repetition is typed `MRN` does the first
/// repetition win. The type code lives in CX-5, with CX-4 accepted as the
/// legacy placement some feeds use.
fn select_mrn(field: &Field) -> Option<&str> {
    let typed = field.repetitions().iter().find(|rep| {
        rep.component(5) == MRN_TYPE_CODE || rep.component(4) == MRN_TYPE_CODE
    });

    let chosen = typed.or_else(|| field.repetitions().first())?;
    let id = chosen.component(1);
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Formats PID-5 as "GIVEN FAMILY", tolerating either part being absent
fn format_patient_name(field: Option<&Field>) -> String {
    let Some(field) = field else {
        return String::new();
    };
    let family = field.component(1);
    let given = field.component(2);

    match (given.is_empty(), family.is_empty()) {
        (false, false) => format!("{given} {family}"),
        (false, true) => given.to_string(),
        (true, false) => family.to_string(),
        (true, true) => String::new(),
    }
}
