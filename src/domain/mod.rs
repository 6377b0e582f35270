//! Domain models and types
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`Mrn`], [`ControlId`]), newtypes so a
//!   control ID can never be passed where a patient identity is expected
//! - **Domain models** ([`CensusEvent`], [`CensusRecord`], [`ObservedAt`])
//! - **Error taxonomy** ([`CensusError`], [`DecodeError`], [`ExtractError`],
//!   [`StorageError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error handling
//!
//! All fallible operations return [`Result<T>`]; component errors convert
//! into [`CensusError`] with the `?` operator and never expose third-party
//! types.

pub mod errors;
pub mod event;
pub mod ids;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{CensusError, DecodeError, ExtractError, StorageError};
pub use event::{CensusEvent, ObservedAt};
pub use ids::{ControlId, Mrn};
pub use record::CensusRecord;
pub use result::Result;
