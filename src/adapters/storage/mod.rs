//! Census storage backends

pub mod memory;
pub mod traits;

pub use memory::InMemoryCensusStore;
pub use traits::{CensusStore, UpsertOutcome};
