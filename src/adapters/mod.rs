//! External integrations
//!
//! Storage backends live here; transports hand bytes to the core and stay
//! outside this crate entirely.

pub mod postgresql;
pub mod storage;
