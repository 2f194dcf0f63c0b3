//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the fhir-ingest configuration file.

use super::{report_failure, EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use crate::config::schema::DatabaseTarget;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates every section
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                report_failure("Configuration is invalid", &e);
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);

        match config.database_target {
            DatabaseTarget::Memory => println!("  Database Target: in-memory"),
            DatabaseTarget::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    use secrecy::ExposeSecret;
                    let conn_str: &str = pg_config.connection_string.expose_secret().as_ref();
                    println!("  Database Target: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        conn_str.rsplit('@').next().unwrap_or("***")
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                    println!("  Run Migrations: {}", pg_config.run_migrations);
                }
            }
        }

        println!(
            "  National ID System Marker: {:?}",
            config.ingest.national_id_system_marker
        );
        if config.logging.local_enabled {
            println!(
                "  File Logging: {} ({})",
                config.logging.local_path, config.logging.local_rotation
            );
        }
        println!();
        Ok(EXIT_OK)
    }
}
