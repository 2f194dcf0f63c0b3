//! Logging and observability
//!
//! This module provides structured logging with:
//! - Configurable log levels (`RUST_LOG` wins when set)
//! - Console output on stderr
//! - Optional JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use fhir_ingest::logging::init_logging;
//! use fhir_ingest::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an ingestion request
///
/// # Example
///
/// ```no_run
/// use fhir_ingest::log_ingest_start;
/// use fhir_ingest::domain::NameHash;
///
/// let hash = NameHash::new("3f2a9c").unwrap();
/// log_ingest_start!(&hash, 12);
/// ```
#[macro_export]
macro_rules! log_ingest_start {
    ($name_hash:expr, $resource_count:expr) => {
        tracing::info!(
            name_hash = %$name_hash,
            resource_count = $resource_count,
            "Starting ingestion"
        );
    };
}

/// Log the completion of an ingestion request
///
/// # Example
///
/// ```no_run
/// use fhir_ingest::log_ingest_complete;
/// use std::time::Duration;
///
/// log_ingest_complete!(7, 3, Duration::from_millis(40));
/// ```
#[macro_export]
macro_rules! log_ingest_complete {
    ($user_id:expr, $mapped:expr, $duration:expr) => {
        tracing::info!(
            user_id = %$user_id,
            mapped = $mapped,
            duration_ms = $duration.as_millis(),
            "Ingestion completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use fhir_ingest::log_error_with_context;
/// use fhir_ingest::domain::IngestError;
///
/// let error = IngestError::Validation("name_hash cannot be empty".to_string());
/// log_error_with_context!(&error, "Rejected ingestion request");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
