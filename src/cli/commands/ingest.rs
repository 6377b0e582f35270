//! Ingest command implementation
//!
//! Reads HL7v2 ADT messages from files and feeds them through the ingestion
//! coordinator. Files may contain a single message or several concatenated
//! messages, each starting with an MSH segment.

use crate::cli::commands::build_store;
use crate::config::load_config;
use crate::core::{IngestCoordinator, IngestOutcome};
use clap::Args;
use std::fs;
use std::path::PathBuf;

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// HL7 message files to ingest
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Per-run ingest counters
#[derive(Debug, Default)]
struct IngestStats {
    applied: usize,
    duplicates: usize,
    superseded: usize,
    rejected: usize,
}

impl IngestArgs {
    /// Execute the ingest command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, files = self.files.len(), "Starting ingest");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let store = match build_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ Storage backend unavailable: {e}");
                return Ok(4);
            }
        };

        let coordinator = IngestCoordinator::new(store, config.reconcile_policy());
        let mut stats = IngestStats::default();

        for path in &self.files {
            let contents = match fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("❌ Failed to read {}: {e}", path.display());
                    return Ok(5);
                }
            };

            let messages = split_messages(&contents);
            if messages.is_empty() {
                tracing::warn!(file = %path.display(), "File contains no messages, skipping");
                println!("⚠️  {} is empty, skipping", path.display());
                continue;
            }

            tracing::info!(
                file = %path.display(),
                messages = messages.len(),
                "Ingesting file"
            );

            for message in &messages {
                let result = match coordinator.ingest(message.as_bytes()).await {
                    Ok(r) => r,
                    Err(e) => {
                        eprintln!("❌ Storage failure, aborting: {e}");
                        return Ok(4);
                    }
                };

                match result.outcome {
                    IngestOutcome::Applied => stats.applied += 1,
                    IngestOutcome::DuplicateIgnored => stats.duplicates += 1,
                    IngestOutcome::SupersededIgnored => stats.superseded += 1,
                    IngestOutcome::Rejected(kind) => {
                        stats.rejected += 1;
                        println!(
                            "⚠️  Rejected ({kind}): {}",
                            result.detail.as_deref().unwrap_or("no detail")
                        );
                    }
                }
            }
        }

        println!();
        println!("Ingest complete:");
        println!("  Applied:    {}", stats.applied);
        println!("  Duplicates: {}", stats.duplicates);
        println!("  Superseded: {}", stats.superseded);
        println!("  Rejected:   {}", stats.rejected);

        if stats.rejected > 0 {
            Ok(3)
        } else {
            Ok(0)
        }
    }
}

/// Splits file contents into individual messages
///
/// A new message starts at each line beginning with `MSH`. Blank lines are
/// discarded. Content before the first MSH line is kept as its own message so
/// the decoder can reject it with a precise error.
fn split_messages(contents: &str) -> Vec<String> {
    let mut messages: Vec<String> = Vec::new();

    for line in contents.split(['\r', '\n']) {
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with("MSH") || messages.is_empty() {
            messages.push(line.to_string());
        } else {
            let current = messages.last_mut().expect("at least one message started");
            current.push('\r');
            current.push_str(line);
        }
    }

    messages
}
