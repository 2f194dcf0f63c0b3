//! Migrate command implementation
//!
//! Applies `migrations/001_initial_schema.sql`. The schema only uses
//! `IF NOT EXISTS`, so running it repeatedly is harmless.

use super::{report_failure, EXIT_CONFIG, EXIT_CONNECTION, EXIT_FATAL, EXIT_OK};
use crate::adapters::database::create_store;
use crate::config::load_config;
use crate::config::schema::DatabaseTarget;
use clap::Args;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {}

impl MigrateArgs {
    /// Execute the migrate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting migrate command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                report_failure("Failed to load configuration file", &e);
                return Ok(EXIT_CONFIG);
            }
        };

        if config.database_target == DatabaseTarget::Memory || config.application.dry_run {
            println!("ℹ️  In-memory store has no schema to migrate");
            return Ok(EXIT_OK);
        }

        // Applied explicitly below
        if let Some(ref mut pg) = config.postgresql {
            pg.run_migrations = false;
        }

        let store = match create_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                report_failure("Failed to connect to database", &e);
                return Ok(EXIT_CONNECTION);
            }
        };

        match store.ensure_schema().await {
            Ok(()) => {
                println!("✅ Schema is up to date");
                Ok(EXIT_OK)
            }
            Err(e) => {
                report_failure("Migration failed", &e);
                Ok(EXIT_FATAL)
            }
        }
    }
}
