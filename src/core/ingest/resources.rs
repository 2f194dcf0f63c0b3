//! Raw resource storage
//!
//! Natural key is `(user_id, fhir_id)`. A numeric `id` keys on its JSON text.
//! Resources whose `id` is absent, null or blank are always inserted.

use super::Stored;
use crate::adapters::database::{FhirStore, InsertOutcome};
use crate::core::navigate::navigate;
use crate::domain::{NewResource, PatientId, ResourceId, ResourceType, Result, StoreError};
use serde_json::Value;
use std::sync::Arc;

/// Stores raw FHIR resources exactly once per natural key
pub struct ResourceStore {
    store: Arc<dyn FhirStore>,
}

impl ResourceStore {
    /// Create a resource store over `store`
    pub fn new(store: Arc<dyn FhirStore>) -> Self {
        Self { store }
    }

    /// The `id` the source system asserted for `resource`, if any
    pub fn fhir_id(resource: &Value) -> Option<String> {
        match navigate(resource, "id")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Store `data` unless the patient already has a resource with `fhir_id`
    ///
    /// An existing row is returned as-is; its payload is never updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn store_once(
        &self,
        user_id: PatientId,
        resource_type: &ResourceType,
        fhir_id: Option<&str>,
        data: &Value,
    ) -> Result<Stored<ResourceId>> {
        if let Some(fhir_id) = fhir_id {
            if let Some(id) = self.store.find_resource(user_id, fhir_id).await? {
                tracing::debug!(resource_id = %id, fhir_id, "Resource already stored");
                return Ok(Stored::existing(id));
            }
        }

        let resource = NewResource {
            user_id,
            resource_type: resource_type.clone(),
            fhir_id: fhir_id.map(str::to_string),
            data: data.clone(),
        };

        match self.store.insert_resource(&resource).await? {
            InsertOutcome::Inserted(id) => Ok(Stored::created(id)),
            InsertOutcome::Conflict => {
                let key = fhir_id.unwrap_or_default();
                let id = self
                    .store
                    .find_resource(user_id, key)
                    .await?
                    .ok_or_else(|| StoreError::UnresolvedConflict {
                        table: "fhir_resources".to_string(),
                        key: format!("({user_id}, {key})"),
                    })?;
                Ok(Stored::existing(id))
            }
        }
    }
}
