//! Domain error types
//!
//! This module defines the error hierarchy for the engine. Errors are split by
//! the component boundary they cross: decode and extract failures are terminal
//! per-message (the message is rejected, never retried), while storage
//! failures are classified so callers can retry the retryable ones. No
//! third-party error types leak through these enums.

use std::time::Duration;
use thiserror::Error;

/// Main census error type
///
/// The top-level error used at the application boundary. Component-specific
/// errors convert into it with `?`.
#[derive(Debug, Error)]
pub enum CensusError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Message decoding errors
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// ADT event extraction errors
    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    /// Storage-layer errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors raised while decoding raw bytes into an HL7 message structure
///
/// All variants are terminal for the message: the input cannot be parsed into
/// segments and fields, and redelivery of the same bytes will fail the same
/// way.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Input was empty or whitespace-only
    #[error("message is empty")]
    EmptyMessage,

    /// The first segment was not MSH
    #[error("first segment must be MSH, found {0:?}")]
    MshNotFirst(String),

    /// Input was not valid text
    #[error("message is not valid UTF-8: {0}")]
    InvalidEncoding(String),
}

/// Errors raised while mapping a decoded message to a census event
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// MSH-9 does not describe an ADT event
    #[error("unsupported message type {0:?}, expected ADT")]
    UnsupportedMessageType(String),

    /// A segment the mapping depends on is absent
    #[error("missing required segment {0}")]
    MissingRequiredSegment(&'static str),

    /// A field the mapping depends on is absent or empty
    #[error("missing required field {0}")]
    MissingRequiredField(&'static str),
}

/// Errors raised by the storage collaborator
#[derive(Debug, Error)]
pub enum StorageError {
    /// A storage call exceeded the configured timeout
    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),

    /// Compare-and-swap retries were exhausted for an MRN
    #[error("write conflict on mrn {0} persisted past retry budget")]
    Conflict(String),

    /// Failed to reach the backing store
    #[error("connection error: {0}")]
    Connection(String),

    /// A query or statement failed
    #[error("query failed: {0}")]
    Query(String),
}

impl StorageError {
    /// Whether the caller may retry the whole ingestion
    ///
    /// Timeouts and conflicts are transient; connection and query failures
    /// need operator attention first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Timeout(_) | StorageError::Conflict(_))
    }
}

impl From<std::io::Error> for CensusError {
    fn from(err: std::io::Error) -> Self {
        CensusError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CensusError {
    fn from(err: serde_json::Error) -> Self {
        CensusError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for CensusError {
    fn from(err: toml::de::Error) -> Self {
        CensusError::Configuration(format!("TOML parse error: {err}"))
    }
}
