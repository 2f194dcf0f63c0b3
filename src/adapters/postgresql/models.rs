//! PostgreSQL row models
//!
//! Decoding of `tokio_postgres` rows into domain records. Column names match
//! `migrations/001_initial_schema.sql`.

use crate::domain::{
    ClaimRecord, ImmunizationRecord, MappedRecord, MedicationRecord, NameHash, PatientId,
    PatientIdentity, ResourceId, Result, StoredResource, StoreError,
};
use tokio_postgres::types::FromSql;
use tokio_postgres::Row;

fn column<'a, T: FromSql<'a>>(row: &'a Row, table: &str, name: &str) -> Result<T> {
    row.try_get(name).map_err(|e| {
        StoreError::InvalidRow {
            table: table.to_string(),
            message: format!("column {name}: {e}"),
        }
        .into()
    })
}

/// Decode a `users` row
pub fn identity_from_row(row: &Row) -> Result<PatientIdentity> {
    let hash: String = column(row, "users", "name_hash")?;
    let name_hash = NameHash::new(hash).map_err(|message| StoreError::InvalidRow {
        table: "users".to_string(),
        message,
    })?;

    Ok(PatientIdentity {
        id: PatientId::new(column(row, "users", "id")?),
        name_hash,
        full_name: column(row, "users", "full_name")?,
    })
}

/// Decode a `fhir_resources` row
pub fn resource_from_row(row: &Row) -> Result<StoredResource> {
    const TABLE: &str = "fhir_resources";
    let resource_type: String = column(row, TABLE, "resource_type")?;

    Ok(StoredResource {
        id: ResourceId::new(column(row, TABLE, "id")?),
        user_id: PatientId::new(column(row, TABLE, "user_id")?),
        resource_type: resource_type.into(),
        fhir_id: column(row, TABLE, "fhir_id")?,
        data: column(row, TABLE, "data")?,
    })
}

/// Decode a `medication_dispenses` row
pub fn medication_from_row(row: &Row) -> Result<MappedRecord> {
    const TABLE: &str = "medication_dispenses";
    Ok(MappedRecord::Medication(MedicationRecord {
        user_id: PatientId::new(column(row, TABLE, "user_id")?),
        resource_id: ResourceId::new(column(row, TABLE, "resource_id")?),
        medication_code: column(row, TABLE, "medication_code")?,
        medication_name: column(row, TABLE, "medication_name")?,
        pharmacy_name: column(row, TABLE, "pharmacy_name")?,
        dispense_date: column(row, TABLE, "when_prepared")?,
        days_supply: column(row, TABLE, "days_supply")?,
        age: column(row, TABLE, "age")?,
    }))
}

/// Decode a `treatment_claims` row
pub fn claim_from_row(row: &Row) -> Result<MappedRecord> {
    const TABLE: &str = "treatment_claims";
    Ok(MappedRecord::Claim(ClaimRecord {
        user_id: PatientId::new(column(row, TABLE, "user_id")?),
        resource_id: ResourceId::new(column(row, TABLE, "resource_id")?),
        claim_type: column(row, TABLE, "claim_type")?,
        claim_date: column(row, TABLE, "created_date")?,
        copay_amount: column(row, TABLE, "copay_amount")?,
        benefit_amount: column(row, TABLE, "benefit_amount")?,
    }))
}

/// Decode an `immunizations` row
pub fn immunization_from_row(row: &Row) -> Result<MappedRecord> {
    const TABLE: &str = "immunizations";
    Ok(MappedRecord::Immunization(ImmunizationRecord {
        user_id: PatientId::new(column(row, TABLE, "user_id")?),
        resource_id: ResourceId::new(column(row, TABLE, "resource_id")?),
        vaccine_name: column(row, TABLE, "vaccine_name")?,
        occurrence_date: column(row, TABLE, "occurrence_date")?,
        dose_number: column(row, TABLE, "dose_number")?,
        performer_name: column(row, TABLE, "performer_name")?,
    }))
}
