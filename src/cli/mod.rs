//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for fhir-ingest using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// fhir-ingest - FHIR normalization engine
#[derive(Parser, Debug)]
#[command(name = "fhir-ingest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "fhir-ingest.toml",
        env = "FHIR_INGEST_CONFIG"
    )]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FHIR_INGEST_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest FHIR resources for a patient
    Ingest(commands::ingest::IngestArgs),

    /// Show row counts per table
    Status(commands::status::StatusArgs),

    /// Delete every row from every table
    Clear(commands::clear::ClearArgs),

    /// Apply the database schema
    Migrate(commands::migrate::MigrateArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
