//! Store abstraction traits
//!
//! This module defines the trait that store backends must implement to hold
//! patient identities, raw FHIR resources and the normalized tables.

use crate::domain::{
    MappedRecord, MappedTable, NameHash, NewResource, PatientId, PatientIdentity, RecordId,
    ResourceId, Result, StoredResource, TableCounts,
};
use async_trait::async_trait;

/// Outcome of an insert guarded by a natural-key unique constraint
///
/// A conflict means another writer got there first; callers re-read the
/// existing row instead of treating it as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome<T> {
    /// The row was written and the store assigned this id
    Inserted(T),

    /// A row with the same natural key already exists
    Conflict,
}

impl<T> InsertOutcome<T> {
    /// Returns the inserted id, if any
    pub fn inserted(self) -> Option<T> {
        match self {
            InsertOutcome::Inserted(id) => Some(id),
            InsertOutcome::Conflict => None,
        }
    }
}

/// Relational store for normalized FHIR data
///
/// Every insert reports a natural-key conflict as [`InsertOutcome::Conflict`]
/// rather than an error. Implementations must enforce:
/// - `users.name_hash` unique
/// - `fhir_resources(user_id, fhir_id)` unique when `fhir_id` is present
/// - `resource_id` unique in each mapped table
#[async_trait]
pub trait FhirStore: Send + Sync {
    /// Short backend name for logs and CLI output
    fn backend_name(&self) -> &'static str;

    /// Test the store connection
    ///
    /// # Errors
    ///
    /// Returns an error if the connection test fails.
    async fn test_connection(&self) -> Result<()>;

    /// Create tables and indexes if they don't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    async fn ensure_schema(&self) -> Result<()>;

    /// Look up an identity by its hash
    async fn find_user(&self, name_hash: &NameHash) -> Result<Option<PatientIdentity>>;

    /// Insert a new identity
    async fn insert_user(
        &self,
        name_hash: &NameHash,
        full_name: Option<&str>,
    ) -> Result<InsertOutcome<PatientId>>;

    /// Look up a stored resource by its natural key
    async fn find_resource(&self, user_id: PatientId, fhir_id: &str)
        -> Result<Option<ResourceId>>;

    /// Insert a raw resource
    ///
    /// Resources without a `fhir_id` never conflict.
    async fn insert_resource(&self, resource: &NewResource) -> Result<InsertOutcome<ResourceId>>;

    /// All raw resources of one patient, in insertion order
    async fn list_resources(&self, user_id: PatientId) -> Result<Vec<StoredResource>>;

    /// Look up the mapped record extracted from `resource_id`
    async fn find_mapped(
        &self,
        table: MappedTable,
        resource_id: ResourceId,
    ) -> Result<Option<RecordId>>;

    /// Insert a mapped record into the table matching its kind
    async fn insert_mapped(&self, record: &MappedRecord) -> Result<InsertOutcome<RecordId>>;

    /// All mapped records of one patient, grouped by table
    async fn list_mapped(&self, user_id: PatientId) -> Result<Vec<MappedRecord>>;

    /// Row counts, optionally restricted to one patient
    async fn table_counts(&self, user_id: Option<PatientId>) -> Result<TableCounts>;

    /// Delete every row, children first, and report what was removed
    async fn delete_all(&self) -> Result<TableCounts>;
}
