//! In-memory store
//!
//! Tables are plain vectors behind one mutex. Ids start at 1 and the same
//! natural-key and foreign-key constraints as the PostgreSQL schema apply.

use crate::adapters::database::traits::{FhirStore, InsertOutcome};
use crate::domain::{
    MappedRecord, MappedTable, NameHash, NewResource, PatientId, PatientIdentity, RecordId,
    ResourceId, Result, StoreError, StoredResource, TableCounts,
};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<PatientIdentity>,
    resources: Vec<StoredResource>,
    mapped: Vec<(RecordId, MappedRecord)>,
    next_user_id: i64,
    next_resource_id: i64,
    next_record_id: i64,
}

impl Tables {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// [`FhirStore`] backed by process memory
///
/// Used for dry runs and tests; contents are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, table: &str) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::query(table, "store mutex poisoned").into())
    }
}

#[async_trait]
impl FhirStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn test_connection(&self) -> Result<()> {
        self.lock("users").map(|_| ())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn find_user(&self, name_hash: &NameHash) -> Result<Option<PatientIdentity>> {
        let tables = self.lock("users")?;
        Ok(tables
            .users
            .iter()
            .find(|user| &user.name_hash == name_hash)
            .cloned())
    }

    async fn insert_user(
        &self,
        name_hash: &NameHash,
        full_name: Option<&str>,
    ) -> Result<InsertOutcome<PatientId>> {
        let mut tables = self.lock("users")?;
        if tables.users.iter().any(|user| &user.name_hash == name_hash) {
            return Ok(InsertOutcome::Conflict);
        }

        let id = PatientId::new(Tables::next_id(&mut tables.next_user_id));
        tables.users.push(PatientIdentity {
            id,
            name_hash: name_hash.clone(),
            full_name: full_name.map(str::to_string),
        });
        Ok(InsertOutcome::Inserted(id))
    }

    async fn find_resource(
        &self,
        user_id: PatientId,
        fhir_id: &str,
    ) -> Result<Option<ResourceId>> {
        let tables = self.lock("fhir_resources")?;
        Ok(tables
            .resources
            .iter()
            .find(|r| r.user_id == user_id && r.fhir_id.as_deref() == Some(fhir_id))
            .map(|r| r.id))
    }

    async fn insert_resource(&self, resource: &NewResource) -> Result<InsertOutcome<ResourceId>> {
        let mut tables = self.lock("fhir_resources")?;

        if !tables.users.iter().any(|user| user.id == resource.user_id) {
            return Err(StoreError::insert(
                "fhir_resources",
                format!("user {} does not exist", resource.user_id),
            )
            .into());
        }

        if let Some(fhir_id) = resource.fhir_id.as_deref() {
            let taken = tables.resources.iter().any(|r| {
                r.user_id == resource.user_id && r.fhir_id.as_deref() == Some(fhir_id)
            });
            if taken {
                return Ok(InsertOutcome::Conflict);
            }
        }

        let id = ResourceId::new(Tables::next_id(&mut tables.next_resource_id));
        tables.resources.push(StoredResource {
            id,
            user_id: resource.user_id,
            resource_type: resource.resource_type.clone(),
            fhir_id: resource.fhir_id.clone(),
            data: resource.data.clone(),
        });
        Ok(InsertOutcome::Inserted(id))
    }

    async fn list_resources(&self, user_id: PatientId) -> Result<Vec<StoredResource>> {
        let tables = self.lock("fhir_resources")?;
        Ok(tables
            .resources
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_mapped(
        &self,
        table: MappedTable,
        resource_id: ResourceId,
    ) -> Result<Option<RecordId>> {
        let tables = self.lock(table.name())?;
        Ok(tables
            .mapped
            .iter()
            .find(|(_, record)| record.table() == table && record.resource_id() == resource_id)
            .map(|(id, _)| *id))
    }

    async fn insert_mapped(&self, record: &MappedRecord) -> Result<InsertOutcome<RecordId>> {
        let table = record.table();
        let mut tables = self.lock(table.name())?;

        if !tables.resources.iter().any(|r| r.id == record.resource_id()) {
            return Err(StoreError::insert(
                table.name(),
                format!("resource {} does not exist", record.resource_id()),
            )
            .into());
        }

        let taken = tables
            .mapped
            .iter()
            .any(|(_, r)| r.table() == table && r.resource_id() == record.resource_id());
        if taken {
            return Ok(InsertOutcome::Conflict);
        }

        // Record ids are unique across all mapped tables here
        let id = RecordId::new(Tables::next_id(&mut tables.next_record_id));
        tables.mapped.push((id, record.clone()));
        Ok(InsertOutcome::Inserted(id))
    }

    async fn list_mapped(&self, user_id: PatientId) -> Result<Vec<MappedRecord>> {
        let tables = self.lock("mapped")?;
        let mut records = Vec::new();
        for table in MappedTable::ALL {
            records.extend(
                tables
                    .mapped
                    .iter()
                    .filter(|(_, r)| r.table() == table && r.user_id() == user_id)
                    .map(|(_, r)| r.clone()),
            );
        }
        Ok(records)
    }

    async fn table_counts(&self, user_id: Option<PatientId>) -> Result<TableCounts> {
        let tables = self.lock("users")?;
        let owned = |id: PatientId| user_id.map_or(true, |wanted| wanted == id);
        let mapped = |table: MappedTable| {
            tables
                .mapped
                .iter()
                .filter(|(_, r)| r.table() == table && owned(r.user_id()))
                .count() as u64
        };

        Ok(TableCounts {
            users: tables.users.iter().filter(|u| owned(u.id)).count() as u64,
            fhir_resources: tables.resources.iter().filter(|r| owned(r.user_id)).count() as u64,
            medication_dispenses: mapped(MappedTable::MedicationDispenses),
            treatment_claims: mapped(MappedTable::TreatmentClaims),
            immunizations: mapped(MappedTable::Immunizations),
        })
    }

    async fn delete_all(&self) -> Result<TableCounts> {
        let counts = self.table_counts(None).await?;
        let mut tables = self.lock("users")?;
        tables.mapped.clear();
        tables.resources.clear();
        tables.users.clear();
        Ok(counts)
    }
}
