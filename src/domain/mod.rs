//! Domain models and types for fhir-ingest.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`NameHash`], [`PatientId`], [`ResourceId`])
//! - **Resource type tag** ([`ResourceType`])
//! - **Normalized records** ([`MedicationRecord`], [`ClaimRecord`], [`ImmunizationRecord`])
//! - **Request/response documents** ([`IngestRequest`], [`IngestResponse`])
//! - **Error types** ([`IngestError`], [`StoreError`]) and the [`Result`] alias
//!
//! # Type Safety
//!
//! Store-assigned ids are newtypes, so a resource id cannot be passed where a
//! patient id is expected:
//!
//! ```rust
//! use fhir_ingest::domain::{PatientId, ResourceId};
//!
//! let patient = PatientId::new(1);
//! let resource = ResourceId::new(1);
//! // let wrong: PatientId = resource;  // Compile error!
//! assert_eq!(patient.get(), resource.get());
//! ```

pub mod errors;
pub mod ids;
pub mod records;
pub mod request;
pub mod resource_type;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{IngestError, StoreError};
pub use ids::{NameHash, PatientId, RecordId, ResourceId};
pub use records::{
    ClaimRecord, ImmunizationRecord, MappedRecord, MappedTable, MedicationRecord, NewResource,
    PatientIdentity, StoredResource, TableCounts,
};
pub use request::{IngestRequest, IngestResponse, IngestResultEntry};
pub use resource_type::ResourceType;
pub use result::Result;
