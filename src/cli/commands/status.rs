//! Status command implementation
//!
//! This module implements the `status` command for displaying row counts per
//! table, optionally for a single patient.

use super::{
    report_failure, EXIT_CONFIG, EXIT_CONNECTION, EXIT_FATAL, EXIT_INPUT, EXIT_OK,
};
use crate::adapters::database::create_store;
use crate::config::load_config;
use crate::domain::{NameHash, TableCounts};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Restrict counts to one patient
    #[arg(long)]
    pub name_hash: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking store status");

        println!("📊 Store Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                report_failure("Failed to load configuration file", &e);
                return Ok(EXIT_CONFIG);
            }
        };

        let name_hash = match self.name_hash.as_deref().map(NameHash::new).transpose() {
            Ok(h) => h,
            Err(e) => {
                report_failure("Invalid --name-hash", &e);
                return Ok(EXIT_INPUT);
            }
        };

        let store = match create_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                report_failure("Failed to connect to database", &e);
                return Ok(EXIT_CONNECTION);
            }
        };
        if let Err(e) = store.test_connection().await {
            report_failure("Failed to connect to database", &e);
            return Ok(EXIT_CONNECTION);
        }

        println!("  Backend: {}", store.backend_name());

        let user_id = match name_hash {
            Some(ref hash) => match store.find_user(hash).await {
                Ok(Some(identity)) => {
                    println!(
                        "  Patient: {} ({})",
                        identity.id,
                        identity.full_name.as_deref().unwrap_or("no display name")
                    );
                    Some(identity.id)
                }
                Ok(None) => {
                    println!("  No patient found for name hash {hash}");
                    return Ok(EXIT_OK);
                }
                Err(e) => {
                    report_failure("Failed to look up patient", &e);
                    return Ok(EXIT_FATAL);
                }
            },
            None => None,
        };

        let counts = match store.table_counts(user_id).await {
            Ok(c) => c,
            Err(e) => {
                report_failure("Failed to count rows", &e);
                return Ok(EXIT_FATAL);
            }
        };

        println!();
        print_counts(&counts);
        println!();
        Ok(EXIT_OK)
    }
}

/// Print one line per table
pub fn print_counts(counts: &TableCounts) {
    println!("{:<24} {:>10}", "Table", "Rows");
    println!("{}", "-".repeat(35));
    for (table, rows) in [
        ("users", counts.users),
        ("fhir_resources", counts.fhir_resources),
        ("medication_dispenses", counts.medication_dispenses),
        ("treatment_claims", counts.treatment_claims),
        ("immunizations", counts.immunizations),
    ] {
        println!("{:<24} {:>10}", table, rows);
    }
}
