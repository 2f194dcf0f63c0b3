//! Ingestion coordinator - orchestrates one ingestion request
//!
//! Steps, in order:
//! 1. Validate the request (before any write)
//! 2. Unwrap the envelope into raw resources
//! 3. Resolve or create the patient identity
//! 4. For each resource: store it once, then run the extractor for its type
//!    and store the mapped record once
//!
//! Resources are processed sequentially. The first store error aborts the
//! request; rows written before it are kept.

use super::{IdentityResolver, MappedRecordStore, ResourceStore};
use crate::adapters::database::FhirStore;
use crate::config::IngestSettings;
use crate::core::extract::{extract, ExtractionContext};
use crate::core::unwrap::unwrap_resources;
use crate::domain::{IngestRequest, IngestResponse, IngestResultEntry, ResourceType, Result};
use crate::{log_error_with_context, log_ingest_complete, log_ingest_start};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters describing what one ingestion request did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Whether the patient identity was created by this request
    pub identity_created: bool,

    /// Resources found in the request after unwrapping
    pub resources_received: usize,

    /// Raw resources newly stored
    pub resources_stored: usize,

    /// Raw resources that were already stored
    pub duplicate_resources: usize,

    /// Resources with no extractor (stored raw only)
    pub unsupported_resources: usize,

    /// Mapped records newly created
    pub mapped_created: usize,

    /// Mapped records that already existed
    pub mapped_existing: usize,

    /// Wall-clock duration of the request
    pub duration: Duration,
}

/// Response plus the counters behind it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub response: IngestResponse,
    pub summary: IngestSummary,
}

/// Ingestion coordinator
pub struct IngestCoordinator {
    settings: IngestSettings,
    identities: IdentityResolver,
    resources: ResourceStore,
    mapped: MappedRecordStore,
}

impl IngestCoordinator {
    /// Create a coordinator writing to `store`
    pub fn new(store: Arc<dyn FhirStore>, settings: IngestSettings) -> Self {
        Self {
            settings,
            identities: IdentityResolver::new(store.clone()),
            resources: ResourceStore::new(store.clone()),
            mapped: MappedRecordStore::new(store),
        }
    }

    /// Ingest one request and return the caller-facing response
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Validation`](crate::domain::IngestError::Validation)
    /// for a malformed request and
    /// [`IngestError::Store`](crate::domain::IngestError::Store) when the store
    /// fails mid-request.
    pub async fn ingest(&self, request: &IngestRequest) -> Result<IngestResponse> {
        Ok(self.ingest_with_report(request).await?.response)
    }

    /// Ingest one request and also return per-request counters
    ///
    /// # Errors
    ///
    /// Same as [`ingest`](Self::ingest).
    pub async fn ingest_with_report(&self, request: &IngestRequest) -> Result<IngestReport> {
        let result = self.run(request).await;
        if let Err(ref e) = result {
            log_error_with_context!(e, "Ingestion request failed");
        }
        result
    }

    async fn run(&self, request: &IngestRequest) -> Result<IngestReport> {
        let start_time = Instant::now();
        let name_hash = request.validated_hash()?;
        let raw_resources = unwrap_resources(&request.resource);

        log_ingest_start!(&name_hash, raw_resources.len());

        let mut summary = IngestSummary {
            resources_received: raw_resources.len(),
            ..IngestSummary::default()
        };

        let identity = self
            .identities
            .resolve_or_create(&name_hash, request.display_name())
            .await?;
        summary.identity_created = identity.created;
        let user_id = identity.id;

        let mut results = Vec::new();

        for resource in &raw_resources {
            let resource_type = ResourceType::of(resource);
            let fhir_id = ResourceStore::fhir_id(resource);

            let stored = self
                .resources
                .store_once(user_id, &resource_type, fhir_id.as_deref(), resource)
                .await?;
            if stored.created {
                summary.resources_stored += 1;
            } else {
                summary.duplicate_resources += 1;
            }

            let ctx = ExtractionContext::new(
                user_id,
                stored.id,
                &self.settings.national_id_system_marker,
            );
            let Some(record) = extract(&resource_type, resource, &ctx) else {
                tracing::debug!(
                    resource_type = %resource_type,
                    resource_id = %stored.id,
                    "No extractor for resource type, stored raw only"
                );
                summary.unsupported_resources += 1;
                continue;
            };

            let mapped = self.mapped.store_once(&record).await?;
            if mapped.created {
                summary.mapped_created += 1;
            } else {
                summary.mapped_existing += 1;
            }

            results.push(IngestResultEntry {
                resource_type,
                resource_id: stored.id,
            });
        }

        summary.duration = start_time.elapsed();
        log_ingest_complete!(user_id, results.len(), summary.duration);

        Ok(IngestReport {
            response: IngestResponse::success(user_id, results),
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::IngestError;
    use serde_json::json;

    fn coordinator() -> IngestCoordinator {
        IngestCoordinator::new(Arc::new(MemoryStore::new()), IngestSettings::default())
    }

    #[tokio::test]
    async fn test_blank_name_hash_is_rejected() {
        let request = IngestRequest::new("", None, json!({"resourceType": "Immunization"}));
        let result = coordinator().ingest(&request).await;
        assert!(matches!(result, Err(IngestError::Validation(_))));
    }

    #[tokio::test]
    async fn test_large_envelope_is_not_capped() {
        let entries = vec![json!({"resource": {"resourceType": "Patient"}}); 10_001];
        let request = IngestRequest::new("h1", None, json!({"publicData": entries}));

        let report = coordinator().ingest_with_report(&request).await.unwrap();
        assert_eq!(report.summary.resources_received, 10_001);
        assert_eq!(report.summary.resources_stored, 10_001);
        assert_eq!(report.summary.unsupported_resources, 10_001);
    }

    #[tokio::test]
    async fn test_summary_counts_duplicates_and_unsupported() {
        let coordinator = coordinator();
        let envelope = json!({"publicData": [
            {"resource": {"resourceType": "Immunization", "id": "im-1"}},
            {"resource": {"resourceType": "Patient", "id": "pt-1"}}
        ]});
        let request = IngestRequest::new("h1", Some("Kim".to_string()), envelope);

        let first = coordinator.ingest_with_report(&request).await.unwrap();
        assert!(first.summary.identity_created);
        assert_eq!(first.summary.resources_stored, 2);
        assert_eq!(first.summary.unsupported_resources, 1);
        assert_eq!(first.response.results.len(), 1);

        let replay = coordinator.ingest_with_report(&request).await.unwrap();
        assert!(!replay.summary.identity_created);
        assert_eq!(replay.summary.duplicate_resources, 2);
        assert_eq!(replay.summary.mapped_existing, 1);
        assert_eq!(replay.response, first.response);
    }
}
