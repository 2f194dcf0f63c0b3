//! Normalized record types
//!
//! These structs mirror the rows of the relational schema. Store-assigned ids
//! are kept out of the "new" records produced by extractors; the store returns
//! them on insert.

use super::ids::{NameHash, PatientId, ResourceId};
use super::resource_type::ResourceType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A row of `users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientIdentity {
    /// Internal id
    pub id: PatientId,

    /// Opaque hash, unique across identities
    pub name_hash: NameHash,

    /// Display name recorded at creation time
    pub full_name: Option<String>,
}

/// A row of `fhir_resources`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResource {
    /// Internal id
    pub id: ResourceId,

    /// Owning patient
    pub user_id: PatientId,

    /// Declared `resourceType`
    pub resource_type: ResourceType,

    /// `id` asserted by the source system, if any
    pub fhir_id: Option<String>,

    /// Raw resource document
    pub data: Value,
}

/// A raw resource about to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewResource {
    /// Owning patient
    pub user_id: PatientId,

    /// Declared `resourceType`
    pub resource_type: ResourceType,

    /// `id` asserted by the source system, if any
    pub fhir_id: Option<String>,

    /// Raw resource document
    pub data: Value,
}

/// Normalized `MedicationDispense`, a row of `medication_dispenses`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub user_id: PatientId,
    pub resource_id: ResourceId,
    pub medication_code: Option<String>,
    pub medication_name: Option<String>,
    pub pharmacy_name: Option<String>,
    /// Date portion of `whenPrepared`
    pub dispense_date: Option<NaiveDate>,
    pub days_supply: Option<f64>,
    /// Age at dispense derived from the national-ID-style identifier
    pub age: Option<i32>,
}

/// Normalized `ExplanationOfBenefit`, a row of `treatment_claims`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub user_id: PatientId,
    pub resource_id: ResourceId,
    pub claim_type: Option<String>,
    /// Billing-period start, falling back to the claim creation date
    pub claim_date: Option<NaiveDate>,
    pub copay_amount: Option<f64>,
    pub benefit_amount: Option<f64>,
}

/// Normalized `Immunization`, a row of `immunizations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmunizationRecord {
    pub user_id: PatientId,
    pub resource_id: ResourceId,
    pub vaccine_name: Option<String>,
    pub occurrence_date: Option<NaiveDate>,
    pub dose_number: Option<f64>,
    pub performer_name: Option<String>,
}

/// Output of one extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappedRecord {
    Medication(MedicationRecord),
    Claim(ClaimRecord),
    Immunization(ImmunizationRecord),
}

impl MappedRecord {
    /// Stored resource this record was extracted from
    pub fn resource_id(&self) -> ResourceId {
        match self {
            MappedRecord::Medication(record) => record.resource_id,
            MappedRecord::Claim(record) => record.resource_id,
            MappedRecord::Immunization(record) => record.resource_id,
        }
    }

    /// Owning patient
    pub fn user_id(&self) -> PatientId {
        match self {
            MappedRecord::Medication(record) => record.user_id,
            MappedRecord::Claim(record) => record.user_id,
            MappedRecord::Immunization(record) => record.user_id,
        }
    }

    /// Table the record is persisted in
    pub fn table(&self) -> MappedTable {
        match self {
            MappedRecord::Medication(_) => MappedTable::MedicationDispenses,
            MappedRecord::Claim(_) => MappedTable::TreatmentClaims,
            MappedRecord::Immunization(_) => MappedTable::Immunizations,
        }
    }
}

/// The three mapped tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappedTable {
    MedicationDispenses,
    TreatmentClaims,
    Immunizations,
}

impl MappedTable {
    /// All mapped tables, in schema order
    pub const ALL: [MappedTable; 3] = [
        MappedTable::MedicationDispenses,
        MappedTable::TreatmentClaims,
        MappedTable::Immunizations,
    ];

    /// SQL table name
    pub fn name(self) -> &'static str {
        match self {
            MappedTable::MedicationDispenses => "medication_dispenses",
            MappedTable::TreatmentClaims => "treatment_claims",
            MappedTable::Immunizations => "immunizations",
        }
    }
}

/// Row counts of every table, optionally restricted to one patient
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub users: u64,
    pub fhir_resources: u64,
    pub medication_dispenses: u64,
    pub treatment_claims: u64,
    pub immunizations: u64,
}

impl TableCounts {
    /// Sum of the three mapped tables
    pub fn mapped_total(&self) -> u64 {
        self.medication_dispenses + self.treatment_claims + self.immunizations
    }
}
