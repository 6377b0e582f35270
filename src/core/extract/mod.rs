//! ADT event extraction
//!
//! Pure mapping from decoded HL7 structures to canonical census events.

pub mod adt;

pub use adt::extract_adt_event;
