//! Patient identity resolution

use super::Stored;
use crate::adapters::database::{FhirStore, InsertOutcome};
use crate::domain::{NameHash, PatientId, Result, StoreError};
use std::sync::Arc;

/// Maps an opaque name hash to a stable internal patient id
pub struct IdentityResolver {
    store: Arc<dyn FhirStore>,
}

impl IdentityResolver {
    /// Create a resolver over `store`
    pub fn new(store: Arc<dyn FhirStore>) -> Self {
        Self { store }
    }

    /// Return the patient for `name_hash`, creating it on first sight
    ///
    /// `full_name` is only recorded when the identity is created; an existing
    /// identity is never updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails, or if an insert conflict cannot be
    /// resolved by re-reading.
    pub async fn resolve_or_create(
        &self,
        name_hash: &NameHash,
        full_name: Option<&str>,
    ) -> Result<Stored<PatientId>> {
        if let Some(identity) = self.store.find_user(name_hash).await? {
            return Ok(Stored::existing(identity.id));
        }

        match self.store.insert_user(name_hash, full_name).await? {
            InsertOutcome::Inserted(id) => {
                tracing::debug!(user_id = %id, "Created patient identity");
                Ok(Stored::created(id))
            }
            InsertOutcome::Conflict => {
                tracing::debug!("Concurrent identity creation, re-reading");
                let identity = self.store.find_user(name_hash).await?.ok_or_else(|| {
                    StoreError::UnresolvedConflict {
                        table: "users".to_string(),
                        key: name_hash.to_string(),
                    }
                })?;
                Ok(Stored::existing(identity.id))
            }
        }
    }
}
