//! Clear command implementation
//!
//! Administrative delete-all. Mapped tables are emptied before
//! `fhir_resources`, which is emptied before `users`.

use super::status::print_counts;
use super::{report_failure, EXIT_CONFIG, EXIT_CONNECTION, EXIT_FATAL, EXIT_OK};
use crate::adapters::database::create_store;
use crate::config::load_config;
use clap::Args;

/// Arguments for the clear command
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ClearArgs {
    /// Execute the clear command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting clear command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                report_failure("Failed to load configuration file", &e);
                return Ok(EXIT_CONFIG);
            }
        };

        if !self.yes {
            print!("Delete ALL patients, resources and mapped records? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Clear cancelled.");
                return Ok(EXIT_OK);
            }
        }

        let store = match create_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                report_failure("Failed to connect to database", &e);
                return Ok(EXIT_CONNECTION);
            }
        };

        match store.delete_all().await {
            Ok(deleted) => {
                tracing::warn!(
                    backend = store.backend_name(),
                    users = deleted.users,
                    "All rows deleted"
                );
                println!("🗑️  Deleted rows:");
                println!();
                print_counts(&deleted);
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                report_failure("Failed to clear store", &e);
                Ok(EXIT_FATAL)
            }
        }
    }
}
