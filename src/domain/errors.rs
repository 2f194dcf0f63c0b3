//! Domain error types
//!
//! This module defines the error hierarchy for fhir-ingest.
//! Errors are domain-specific and don't expose third-party driver types.
//!
//! Malformed data inside a FHIR resource is never an error: extractors degrade
//! to absent values. Duplicate ingestion and unsupported resource types are not
//! errors either. What remains are request-level problems and store failures.

use thiserror::Error;

/// Main fhir-ingest error type
#[derive(Debug, Error)]
pub enum IngestError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Relational store errors; these abort the current ingestion batch
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Malformed ingestion request (missing name hash, missing resource, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Ingestion interrupted by a shutdown signal
    #[error("Interrupted: {0}")]
    Interrupted(String),
}

/// Relational store errors
///
/// Raised when the external store cannot be reached or rejects an operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to connect or to obtain a pooled connection
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// Schema migration failed
    #[error("Failed to apply schema: {0}")]
    MigrationFailed(String),

    /// A select failed
    #[error("Query failed on {table}: {message}")]
    QueryFailed { table: String, message: String },

    /// An insert failed for a reason other than a natural-key conflict
    #[error("Insert failed on {table}: {message}")]
    InsertFailed { table: String, message: String },

    /// A delete failed
    #[error("Delete failed on {table}: {message}")]
    DeleteFailed { table: String, message: String },

    /// The insert hit a natural-key conflict and the follow-up read found nothing
    #[error("Conflict on {table} could not be resolved: {key}")]
    UnresolvedConflict { table: String, key: String },

    /// A stored row could not be decoded into a domain value
    #[error("Invalid row in {table}: {message}")]
    InvalidRow { table: String, message: String },
}

impl StoreError {
    /// Builds a [`StoreError::QueryFailed`]
    pub fn query(table: impl Into<String>, message: impl ToString) -> Self {
        StoreError::QueryFailed {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Builds a [`StoreError::InsertFailed`]
    pub fn insert(table: impl Into<String>, message: impl ToString) -> Self {
        StoreError::InsertFailed {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Builds a [`StoreError::DeleteFailed`]
    pub fn delete(table: impl Into<String>, message: impl ToString) -> Self {
        StoreError::DeleteFailed {
            table: table.into(),
            message: message.to_string(),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for IngestError {
    fn from(err: toml::de::Error) -> Self {
        IngestError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_display() {
        let err = IngestError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_store_error_conversion() {
        let store_err = StoreError::ConnectionFailed("refused".to_string());
        let err: IngestError = store_err.into();
        assert!(matches!(err, IngestError::Store(_)));
        assert_eq!(
            err.to_string(),
            "Store error: Failed to connect to store: refused"
        );
    }

    #[test]
    fn test_store_error_helpers() {
        let err = StoreError::insert("users", "duplicate key");
        assert_eq!(err.to_string(), "Insert failed on users: duplicate key");

        let err = StoreError::query("fhir_resources", "timeout");
        assert!(matches!(err, StoreError::QueryFailed { .. }));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: IngestError = io_err.into();
        assert!(matches!(err, IngestError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: IngestError = json_err.into();
        assert!(matches!(err, IngestError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: IngestError = toml_err.into();
        assert!(matches!(err, IngestError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
