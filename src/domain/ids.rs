//! Domain identifier types with validation
//!
//! Newtype wrappers for the two identities the engine keys on: the patient's
//! medical record number and the message control ID. Each validates
//! non-emptiness at construction so downstream code never has to re-check.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Medical record number newtype wrapper
///
/// The unique identity of a patient within a facility. At most one
/// [`CensusRecord`](crate::domain::CensusRecord) exists per MRN.
///
/// # Examples
///
/// ```
/// use census::domain::Mrn;
///
/// let mrn = Mrn::new("PAT999").unwrap();
/// assert_eq!(mrn.as_str(), "PAT999");
/// assert!(Mrn::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mrn(String);

impl Mrn {
    /// Creates a new Mrn from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty or whitespace-only.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("MRN cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the MRN as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Mrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Mrn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Mrn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Message control ID newtype wrapper
///
/// The sending system's unique ID for one message (MSH-10). Used as the
/// deduplication key: an event is applied at most once per control ID per MRN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlId(String);

impl ControlId {
    /// Creates a new ControlId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty or whitespace-only.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Control ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the control ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ControlId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ControlId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
