//! # fhir-ingest - FHIR normalization engine
//!
//! fhir-ingest accepts FHIR resources for a patient, stores every raw resource
//! exactly once, and maps supported resource types into flat relational tables
//! for analytics.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Resolving** a patient identity from a name hash, creating it on first sight
//! - **Unwrapping** Bundles and `publicData` envelopes into individual resources
//! - **Storing** raw resources idempotently, keyed by patient and FHIR id
//! - **Mapping** MedicationDispense, ExplanationOfBenefit and Immunization
//!   resources into normalized records, with age at event derived from the
//!   national registration number
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (unwrap, extract, age, ingestion pipeline)
//! - [`adapters`] - Store backends (PostgreSQL, in-memory)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fhir_ingest::adapters::database::create_store;
//! use fhir_ingest::config::load_config;
//! use fhir_ingest::core::ingest::IngestCoordinator;
//! use fhir_ingest::domain::IngestRequest;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("fhir-ingest.toml")?;
//! let store = create_store(&config).await?;
//! let coordinator = IngestCoordinator::new(store, config.ingest.clone());
//!
//! let request = IngestRequest::new(
//!     "3f2a9c",
//!     Some("Kim".to_string()),
//!     json!({"resourceType": "Immunization", "id": "im-1"}),
//! );
//! let response = coordinator.ingest(&request).await?;
//! println!("user {} -> {} resource(s)", response.user_id, response.results.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`], whose error is
//! [`domain::IngestError`]. Store failures are wrapped as
//! [`domain::StoreError`] and propagate unchanged; writes committed before a
//! failure stay committed.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
