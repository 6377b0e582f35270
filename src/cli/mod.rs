//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the census engine
//! using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Census - HL7v2 ADT ingestion and census reconciliation
#[derive(Parser, Debug)]
#[command(name = "census")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "census.toml", env = "CENSUS_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CENSUS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest HL7v2 ADT messages from one or more files
    Ingest(commands::ingest::IngestArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize the census storage schema
    Init(commands::init::InitArgs),
}
