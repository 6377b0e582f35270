// Census - HL7v2 ADT Ingestion and Census Reconciliation
// Copyright (c) 2026 Census Contributors
// Licensed under the MIT License

//! # Census - HL7v2 ADT Ingestion and Census Reconciliation
//!
//! Census ingests HL7v2 ADT messages and maintains a reconciled, per-patient
//! hospital census: for every medical record number, the patient's current
//! identity and unit as asserted by the most recent admission, transfer, or
//! discharge event.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Decoding** HL7v2 messages into segments, fields, repetitions, and
//!   components, honoring the separator characters each message declares
//! - **Extracting** census events from ADT messages (MRN, patient name,
//!   date of birth, unit, control ID, event time)
//! - **Reconciling** events against stored records with last-writer-wins by
//!   event time, duplicate suppression by control ID, and optimistic
//!   concurrency so concurrent updates never interleave torn state
//!
//! ## Architecture
//!
//! Census follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (extract, reconcile, ingest)
//! - [`hl7`] - HL7v2 message decoding
//! - [`adapters`] - Storage backends (in-memory, PostgreSQL)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use census::adapters::storage::InMemoryCensusStore;
//! use census::core::{IngestCoordinator, ReconcilePolicy};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryCensusStore::new());
//!     let coordinator = IngestCoordinator::new(store, ReconcilePolicy::default());
//!
//!     let raw = b"MSH|^~\\&|ADT|HOSP|||20250101120000||ADT^A01|MSG001|P|2.3\rPID|1||PAT001^^^HOSP^MRN||DOE^JOHN||19700101\rPV1|1|I|ICU";
//!
//!     let result = coordinator.ingest(raw).await?;
//!     println!("{}", result.outcome);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Malformed or unsupported messages are reported as classified
//! [`core::RejectKind`] outcomes, not errors; only storage failures surface
//! as `Err`. Everything else uses [`domain::CensusError`]:
//!
//! ```rust,no_run
//! use census::domain::CensusError;
//!
//! fn example() -> Result<(), CensusError> {
//!     let _config = census::config::CensusConfig::from_file("census.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Census uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(mrn = "PAT001", outcome = "applied", "Message reconciled");
//! warn!(reason = "missing_required_segment", "Message rejected");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod hl7;
pub mod logging;
