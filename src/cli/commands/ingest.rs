//! Ingest command implementation
//!
//! This module implements the `ingest` command, which feeds one or more
//! ingestion requests through the normalization pipeline and prints each
//! response as JSON on stdout. Progress and errors go to stderr.

use super::{
    exit_code_for, report_failure, EXIT_CONFIG, EXIT_CONNECTION, EXIT_INTERRUPTED, EXIT_OK,
};
use crate::adapters::database::create_store;
use crate::config::load_config;
use crate::core::ingest::IngestCoordinator;
use crate::domain::{IngestError, IngestRequest, Result};
use clap::Args;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Request file: one request object or a JSON array of requests
    #[arg(short, long, conflicts_with_all = ["name_hash", "resource"])]
    pub file: Option<PathBuf>,

    /// Patient name hash (with --resource)
    #[arg(long, requires = "resource")]
    pub name_hash: Option<String>,

    /// Patient display name, recorded on first ingestion only
    #[arg(long, requires = "name_hash")]
    pub full_name: Option<String>,

    /// FHIR resource or `publicData` envelope file (with --name-hash)
    #[arg(long, requires = "name_hash")]
    pub resource: Option<PathBuf>,

    /// Dry run mode - ingest into a throwaway in-memory store
    #[arg(long)]
    pub dry_run: bool,
}

impl IngestArgs {
    /// Execute the ingest command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting ingest command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                report_failure("Failed to load configuration file", &e);
                return Ok(EXIT_CONFIG);
            }
        };

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }
        if config.application.dry_run {
            eprintln!("🔍 DRY RUN MODE - No data will be written to the database");
        }

        let requests = match self.load_requests() {
            Ok(r) => r,
            Err(e) => {
                report_failure("Invalid ingestion input", &e);
                return Ok(exit_code_for(&e));
            }
        };

        if requests.is_empty() {
            eprintln!("⚠️  No ingestion requests found, nothing to do");
            return Ok(EXIT_OK);
        }

        let store = match create_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create store");
                report_failure("Failed to connect to database", &e);
                return Ok(exit_code_for(&e));
            }
        };
        if let Err(e) = store.test_connection().await {
            report_failure("Failed to connect to database", &e);
            return Ok(EXIT_CONNECTION);
        }

        let coordinator = IngestCoordinator::new(store, config.ingest.clone());
        let total = requests.len();

        for (index, request) in requests.iter().enumerate() {
            if *shutdown_signal.borrow() {
                let e = IngestError::Interrupted(format!(
                    "stopped after {index} of {total} requests"
                ));
                tracing::info!(processed = index, total, "Ingestion interrupted by user signal");
                eprintln!("⚠️  Ingestion interrupted: {e}");
                return Ok(EXIT_INTERRUPTED);
            }

            let report = match coordinator.ingest_with_report(request).await {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("❌ Request {} of {} failed", index + 1, total);
                    eprintln!("   Error: {e}");
                    if index > 0 {
                        eprintln!("   {index} earlier request(s) were committed");
                    }
                    return Ok(exit_code_for(&e));
                }
            };

            println!("{}", serde_json::to_string_pretty(&report.response)?);

            let summary = &report.summary;
            eprintln!(
                "✅ Request {}/{}: user {} | {} resource(s), {} new, {} duplicate, {} unsupported | {} mapped ({} new) in {:.2}s",
                index + 1,
                total,
                report.response.user_id,
                summary.resources_received,
                summary.resources_stored,
                summary.duplicate_resources,
                summary.unsupported_resources,
                summary.mapped_created + summary.mapped_existing,
                summary.mapped_created,
                summary.duration.as_secs_f64()
            );
        }

        Ok(EXIT_OK)
    }

    /// Build the requests named by the arguments
    fn load_requests(&self) -> Result<Vec<IngestRequest>> {
        match (&self.file, &self.name_hash, &self.resource) {
            (Some(file), _, _) => parse_request_document(read_json(file)?),
            (None, Some(name_hash), Some(resource)) => Ok(vec![IngestRequest::new(
                name_hash.clone(),
                self.full_name.clone(),
                read_json(resource)?,
            )]),
            _ => Err(IngestError::Validation(
                "either --file or --name-hash with --resource is required".to_string(),
            )),
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .map_err(|e| IngestError::Io(format!("Failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&text).map_err(|e| {
        IngestError::Serialization(format!("{} is not valid JSON: {e}", path.display()))
    })
}

/// One request object, or an array of request objects processed in order
pub fn parse_request_document(document: Value) -> Result<Vec<IngestRequest>> {
    match document {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item).map_err(|e| {
                    IngestError::Serialization(format!("request #{}: {e}", i + 1))
                })
            })
            .collect(),
        Value::Object(_) => Ok(vec![serde_json::from_value(document)?]),
        _ => Err(IngestError::Validation(
            "request document must be an object or an array of objects".to_string(),
        )),
    }
}
