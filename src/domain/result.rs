//! Result type alias for the crate

use crate::domain::errors::CensusError;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, CensusError>;
