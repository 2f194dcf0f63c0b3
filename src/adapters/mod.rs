//! Store backends for fhir-ingest.
//!
//! - [`database`] - Store abstraction (trait-based) and factory
//! - [`postgresql`] - PostgreSQL implementation
//! - [`memory`] - In-process implementation for dry runs and tests
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate the relational store
//! from the normalization logic. The ingestion core only sees
//! [`database::FhirStore`].
//!
//! ```rust
//! use fhir_ingest::adapters::database::create_store;
//! use fhir_ingest::config::IngestConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = create_store(&IngestConfig::in_memory()).await?;
//! assert_eq!(store.backend_name(), "memory");
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod memory;
pub mod postgresql;
