//! Field extractors
//!
//! One pure function per supported resource type maps a raw FHIR resource to
//! a flat record. Extractors never fail: missing structure produces absent
//! fields. Selection happens on the parsed [`ResourceType`]; unknown tags have
//! no extractor.

pub mod claim;
pub mod immunization;
pub mod medication;

use crate::domain::{MappedRecord, PatientId, ResourceId, ResourceType};
use serde_json::Value;

pub use claim::extract_claim;
pub use immunization::extract_immunization;
pub use medication::extract_medication;

/// Inputs every extractor needs besides the resource itself
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    /// Resolved patient
    pub user_id: PatientId,

    /// Internal id of the stored raw resource
    pub resource_id: ResourceId,

    /// Marker identifying the national-ID identifier system
    pub national_id_marker: &'a str,
}

impl<'a> ExtractionContext<'a> {
    /// Creates a context
    pub fn new(user_id: PatientId, resource_id: ResourceId, national_id_marker: &'a str) -> Self {
        Self {
            user_id,
            resource_id,
            national_id_marker,
        }
    }
}

/// Runs the extractor registered for `resource_type`
///
/// Returns `None` for unsupported types.
pub fn extract(
    resource_type: &ResourceType,
    resource: &Value,
    ctx: &ExtractionContext<'_>,
) -> Option<MappedRecord> {
    let record = match resource_type {
        ResourceType::MedicationDispense => {
            MappedRecord::Medication(extract_medication(resource, ctx))
        }
        ResourceType::ExplanationOfBenefit => MappedRecord::Claim(extract_claim(resource, ctx)),
        ResourceType::Immunization => {
            MappedRecord::Immunization(extract_immunization(resource, ctx))
        }
        ResourceType::Other(_) => return None,
    };
    Some(record)
}
