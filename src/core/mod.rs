//! Core normalization logic for fhir-ingest.
//!
//! # Modules
//!
//! - [`unwrap`] - Envelope unwrapping (`publicData[].resource`)
//! - [`navigate`] - Safe navigation over untyped JSON documents
//! - [`extract`] - Per-type field extractors
//! - [`age`] - Age-at-event derivation from national-ID identifiers
//! - [`ingest`] - Identity resolution, idempotent storage and orchestration
//!
//! # Ingestion Workflow
//!
//! 1. **Validate**: reject blank `name_hash` or non-object `resource`
//! 2. **Unwrap**: split the envelope into raw resources
//! 3. **Resolve**: find or create the patient identity
//! 4. **Store**: write each raw resource once per `(patient, id)`
//! 5. **Extract**: map supported types to flat records and store them once
//!
//! # Example
//!
//! ```rust
//! use fhir_ingest::adapters::memory::MemoryStore;
//! use fhir_ingest::config::IngestSettings;
//! use fhir_ingest::core::ingest::IngestCoordinator;
//! use fhir_ingest::domain::IngestRequest;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = IngestCoordinator::new(Arc::new(MemoryStore::new()), IngestSettings::default());
//!
//! let request = IngestRequest::new(
//!     "3f2a9c",
//!     Some("Hong Gildong".to_string()),
//!     json!({"resourceType": "Immunization", "id": "im-1"}),
//! );
//! let response = coordinator.ingest(&request).await?;
//! assert_eq!(response.results.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod age;
pub mod extract;
pub mod ingest;
pub mod navigate;
pub mod unwrap;
