//! Mapped record storage

use super::Stored;
use crate::adapters::database::{FhirStore, InsertOutcome};
use crate::domain::{MappedRecord, RecordId, Result, StoreError};
use std::sync::Arc;

/// Stores at most one mapped record per stored resource
pub struct MappedRecordStore {
    store: Arc<dyn FhirStore>,
}

impl MappedRecordStore {
    /// Create a mapped record store over `store`
    pub fn new(store: Arc<dyn FhirStore>) -> Self {
        Self { store }
    }

    /// Insert `record` unless its table already holds one for the same resource
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn store_once(&self, record: &MappedRecord) -> Result<Stored<RecordId>> {
        let table = record.table();
        let resource_id = record.resource_id();

        if let Some(id) = self.store.find_mapped(table, resource_id).await? {
            return Ok(Stored::existing(id));
        }

        match self.store.insert_mapped(record).await? {
            InsertOutcome::Inserted(id) => {
                tracing::debug!(
                    table = table.name(),
                    %resource_id,
                    record_id = %id,
                    "Mapped record created"
                );
                Ok(Stored::created(id))
            }
            InsertOutcome::Conflict => {
                let id = self
                    .store
                    .find_mapped(table, resource_id)
                    .await?
                    .ok_or_else(|| StoreError::UnresolvedConflict {
                        table: table.name().to_string(),
                        key: resource_id.to_string(),
                    })?;
                Ok(Stored::existing(id))
            }
        }
    }
}
