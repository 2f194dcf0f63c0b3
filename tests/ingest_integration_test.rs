//! End-to-end ingestion tests against the in-memory store

use async_trait::async_trait;
use chrono::NaiveDate;
use fhir_ingest::adapters::database::{FhirStore, InsertOutcome};
use fhir_ingest::adapters::memory::MemoryStore;
use fhir_ingest::config::IngestSettings;
use fhir_ingest::core::ingest::IngestCoordinator;
use fhir_ingest::domain::{
    IngestError, IngestRequest, MappedRecord, MappedTable, MedicationRecord, NameHash,
    NewResource, PatientId, PatientIdentity, RecordId, ResourceId, ResourceType, Result,
    StoreError, StoredResource, TableCounts,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use test_case::test_case;

fn patient(registration: &str) -> Value {
    json!({
        "resourceType": "Patient",
        "identifier": [
            {"system": "urn:kr:insurance-card", "value": "12345678901"},
            {"system": "urn:kr:resident-registration-number", "value": registration}
        ]
    })
}

fn dispense(id: &str, registration: &str, when_prepared: &str) -> Value {
    json!({
        "resourceType": "MedicationDispense",
        "id": id,
        "medicationReference": {"resource": {
            "code": {"coding": [{"code": "641900090", "display": "Tylenol 500mg"}]}
        }},
        "subject": {"resource": patient(registration)},
        "performer": [{"actor": {"resource": {"name": "Seoul Pharmacy"}}}],
        "whenPrepared": when_prepared,
        "daysSupply": {"value": 5}
    })
}

fn claim(id: &str) -> Value {
    json!({
        "resourceType": "ExplanationOfBenefit",
        "id": id,
        "type": {"coding": [{"code": "pharmacy"}]},
        "billablePeriod": {"start": "2024-03-02"},
        "total": [
            {"category": {"coding": [{"code": "copay"}]}, "amount": {"value": 3600}},
            {"category": {"coding": [{"code": "benefit"}]}, "amount": {"value": 8400}}
        ]
    })
}

fn immunization(id: &str) -> Value {
    json!({
        "resourceType": "Immunization",
        "id": id,
        "vaccineCode": {"coding": [{"display": "Influenza"}]},
        "occurrenceDateTime": "2023-10-20T09:00:00+09:00",
        "protocolApplied": [{"doseNumberPositiveInt": 1}]
    })
}

fn envelope(resources: Vec<Value>) -> Value {
    json!({
        "publicData": resources
            .into_iter()
            .map(|resource| json!({"resource": resource}))
            .collect::<Vec<_>>()
    })
}

fn coordinator_over(store: Arc<dyn FhirStore>) -> IngestCoordinator {
    IngestCoordinator::new(store, IngestSettings::default())
}

fn setup() -> (Arc<MemoryStore>, IngestCoordinator) {
    let store = Arc::new(MemoryStore::new());
    let coordinator = coordinator_over(store.clone());
    (store, coordinator)
}

async fn only_medication(store: &MemoryStore, user_id: PatientId) -> MedicationRecord {
    let mapped = store.list_mapped(user_id).await.unwrap();
    assert_eq!(mapped.len(), 1);
    match mapped.into_iter().next() {
        Some(MappedRecord::Medication(record)) => record,
        other => panic!("expected a medication record, got {other:?}"),
    }
}

#[tokio::test]
async fn test_envelope_maps_every_supported_type() {
    let (store, coordinator) = setup();
    let request = IngestRequest::new(
        "hash-kim",
        Some("Kim".to_string()),
        envelope(vec![
            dispense("md-1", "900101-1", "2024-06-15T10:00:00+09:00"),
            claim("eob-1"),
            immunization("im-1"),
            patient("900101-1"),
        ]),
    );

    let response = coordinator.ingest(&request).await.unwrap();

    assert_eq!(response.status, "success");
    let types: Vec<_> = response.results.iter().map(|r| r.resource_type.clone()).collect();
    assert_eq!(
        types,
        [
            ResourceType::MedicationDispense,
            ResourceType::ExplanationOfBenefit,
            ResourceType::Immunization
        ]
    );

    let counts = store.table_counts(Some(response.user_id)).await.unwrap();
    assert_eq!(
        counts,
        TableCounts {
            users: 1,
            fhir_resources: 4,
            medication_dispenses: 1,
            treatment_claims: 1,
            immunizations: 1,
        }
    );
}

#[tokio::test]
async fn test_replay_is_idempotent() {
    let (store, coordinator) = setup();
    let request = IngestRequest::new(
        "hash-lee",
        None,
        dispense("md-1", "900101-1", "2024-06-15"),
    );

    let first = coordinator.ingest(&request).await.unwrap();
    let second = coordinator.ingest(&request).await.unwrap();

    assert_eq!(first, second);
    let counts = store.table_counts(None).await.unwrap();
    assert_eq!(counts.users, 1);
    assert_eq!(counts.fhir_resources, 1);
    assert_eq!(counts.medication_dispenses, 1);
}

#[tokio::test]
async fn test_two_resources_one_identity() {
    let (store, coordinator) = setup();

    let a = coordinator
        .ingest(&IngestRequest::new("hash-park", None, immunization("im-1")))
        .await
        .unwrap();
    let b = coordinator
        .ingest(&IngestRequest::new("hash-park", None, immunization("im-2")))
        .await
        .unwrap();

    assert_eq!(a.user_id, b.user_id);
    assert_ne!(a.results[0].resource_id, b.results[0].resource_id);

    let counts = store.table_counts(None).await.unwrap();
    assert_eq!(counts.users, 1);
    assert_eq!(counts.fhir_resources, 2);
    assert_eq!(counts.immunizations, 2);
}

#[tokio::test]
async fn test_same_fhir_id_for_different_patients() {
    let (store, coordinator) = setup();

    let a = coordinator
        .ingest(&IngestRequest::new("hash-a", None, immunization("im-1")))
        .await
        .unwrap();
    let b = coordinator
        .ingest(&IngestRequest::new("hash-b", None, immunization("im-1")))
        .await
        .unwrap();

    assert_ne!(a.user_id, b.user_id);
    assert_eq!(store.table_counts(None).await.unwrap().fhir_resources, 2);
}

#[tokio::test]
async fn test_resources_without_id_are_always_stored() {
    let (store, coordinator) = setup();
    let mut resource = immunization("unused");
    resource.as_object_mut().unwrap().remove("id");
    let request = IngestRequest::new("hash-anon", None, resource);

    coordinator.ingest(&request).await.unwrap();
    coordinator.ingest(&request).await.unwrap();

    let counts = store.table_counts(None).await.unwrap();
    assert_eq!(counts.fhir_resources, 2);
    assert_eq!(counts.immunizations, 2);
}

#[tokio::test]
async fn test_replay_with_numeric_id_is_idempotent() {
    let (store, coordinator) = setup();
    let request = IngestRequest::new(
        "hash-num",
        None,
        json!({"resourceType": "Immunization", "id": 123}),
    );

    let first = coordinator.ingest(&request).await.unwrap();
    let second = coordinator.ingest(&request).await.unwrap();

    assert_eq!(first, second);
    let counts = store.table_counts(None).await.unwrap();
    assert_eq!(counts.fhir_resources, 1);
    assert_eq!(counts.immunizations, 1);

    let stored = store.list_resources(first.user_id).await.unwrap();
    assert_eq!(stored[0].fhir_id.as_deref(), Some("123"));
}

#[tokio::test]
async fn test_first_full_name_wins() {
    let (store, coordinator) = setup();

    coordinator
        .ingest(&IngestRequest::new("hash-choi", Some("Choi".to_string()), immunization("im-1")))
        .await
        .unwrap();
    coordinator
        .ingest(&IngestRequest::new("hash-choi", Some("Renamed".to_string()), immunization("im-2")))
        .await
        .unwrap();

    let identity = store
        .find_user(&NameHash::new("hash-choi").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(identity.full_name.as_deref(), Some("Choi"));
}

#[test_case("900101-1", "2024-06-15", Some(34) ; "born 1990")]
#[test_case("0506304", "2024-01-01", Some(18) ; "born 2005")]
#[test_case("0506302", "2024-01-01", Some(118) ; "century code 2 is 1905 not 2005")]
#[test_case("900101-1", "2024-01-01", Some(34) ; "birthday on the event date")]
#[test_case("9001", "2024-01-01", None ; "too few digits")]
#[test_case("901301-1", "2024-01-01", None ; "impossible month")]
#[tokio::test]
async fn test_age_at_dispense(registration: &str, when_prepared: &str, expected: Option<i32>) {
    let (store, coordinator) = setup();
    let resource = dispense("md-1", registration, when_prepared);
    let request = IngestRequest::new("hash-age", None, resource);

    let response = coordinator.ingest(&request).await.unwrap();
    let record = only_medication(&store, response.user_id).await;
    assert_eq!(record.age, expected);
}

#[tokio::test]
async fn test_dispense_without_performer_or_date() {
    let (store, coordinator) = setup();
    let mut resource = dispense("md-1", "900101-1", "2024-06-15");
    let object = resource.as_object_mut().unwrap();
    object.remove("performer");
    object.remove("whenPrepared");

    let response = coordinator
        .ingest(&IngestRequest::new("hash-sparse", None, resource))
        .await
        .unwrap();

    let record = only_medication(&store, response.user_id).await;
    assert_eq!(record.pharmacy_name, None);
    assert_eq!(record.dispense_date, None);
    assert_eq!(record.age, None);
    assert_eq!(record.medication_name.as_deref(), Some("Tylenol 500mg"));
    assert_eq!(record.days_supply, Some(5.0));
}

#[tokio::test]
async fn test_claim_with_only_deductible_total() {
    let (store, coordinator) = setup();
    let resource = json!({
        "resourceType": "ExplanationOfBenefit",
        "id": "eob-9",
        "created": "2024-02-01T12:00:00Z",
        "total": [{"category": {"coding": [{"code": "deductible"}]}, "amount": {"value": 500}}]
    });

    let response = coordinator
        .ingest(&IngestRequest::new("hash-eob", None, resource))
        .await
        .unwrap();

    let mapped = store.list_mapped(response.user_id).await.unwrap();
    let MappedRecord::Claim(record) = &mapped[0] else {
        panic!("expected a claim record, got {mapped:?}");
    };
    assert_eq!(record.copay_amount, None);
    assert_eq!(record.benefit_amount, None);
    assert_eq!(record.claim_date, NaiveDate::from_ymd_opt(2024, 2, 1));
}

#[tokio::test]
async fn test_unsupported_type_is_stored_raw_only() {
    let (store, coordinator) = setup();

    let response = coordinator
        .ingest(&IngestRequest::new("hash-pt", None, patient("900101-1")))
        .await
        .unwrap();

    assert!(response.results.is_empty());
    let resources = store.list_resources(response.user_id).await.unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].resource_type, ResourceType::Other("Patient".to_string()));
    assert_eq!(resources[0].data, patient("900101-1"));
    assert_eq!(store.table_counts(None).await.unwrap().mapped_total(), 0);
}

#[tokio::test]
async fn test_malformed_envelope_entries_are_dropped() {
    let (store, coordinator) = setup();
    let payload = json!({"publicData": [
        {"resource": immunization("im-1")},
        {"meta": "no resource here"},
        "not an object",
        {"resource": immunization("im-2")}
    ]});

    let response = coordinator
        .ingest(&IngestRequest::new("hash-env", None, payload))
        .await
        .unwrap();

    assert_eq!(response.results.len(), 2);
    let stored = store.list_resources(response.user_id).await.unwrap();
    let ids: Vec<_> = stored.iter().filter_map(|r| r.fhir_id.as_deref()).collect();
    assert_eq!(ids, ["im-1", "im-2"]);
}

#[tokio::test]
async fn test_invalid_request_writes_nothing() {
    let (store, coordinator) = setup();

    let blank = coordinator
        .ingest(&IngestRequest::new("   ", None, immunization("im-1")))
        .await;
    assert!(matches!(blank, Err(IngestError::Validation(_))));

    let scalar = coordinator
        .ingest(&IngestRequest::new("hash-x", None, json!("text")))
        .await;
    assert!(matches!(scalar, Err(IngestError::Validation(_))));

    assert_eq!(store.table_counts(None).await.unwrap(), TableCounts::default());
}

/// Hides existing rows from the first lookup of each kind, as if another
/// writer committed between lookup and insert
struct RacingStore {
    inner: Arc<MemoryStore>,
    user_hidden: AtomicBool,
    resource_hidden: AtomicBool,
    mapped_hidden: AtomicBool,
}

impl RacingStore {
    fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            user_hidden: AtomicBool::new(true),
            resource_hidden: AtomicBool::new(true),
            mapped_hidden: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl FhirStore for RacingStore {
    fn backend_name(&self) -> &'static str {
        "racing"
    }

    async fn test_connection(&self) -> Result<()> {
        self.inner.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.inner.ensure_schema().await
    }

    async fn find_user(&self, name_hash: &NameHash) -> Result<Option<PatientIdentity>> {
        if self.user_hidden.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_user(name_hash).await
    }

    async fn insert_user(
        &self,
        name_hash: &NameHash,
        full_name: Option<&str>,
    ) -> Result<InsertOutcome<PatientId>> {
        self.inner.insert_user(name_hash, full_name).await
    }

    async fn find_resource(&self, user_id: PatientId, fhir_id: &str) -> Result<Option<ResourceId>> {
        if self.resource_hidden.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_resource(user_id, fhir_id).await
    }

    async fn insert_resource(&self, resource: &NewResource) -> Result<InsertOutcome<ResourceId>> {
        self.inner.insert_resource(resource).await
    }

    async fn list_resources(&self, user_id: PatientId) -> Result<Vec<StoredResource>> {
        self.inner.list_resources(user_id).await
    }

    async fn find_mapped(
        &self,
        table: MappedTable,
        resource_id: ResourceId,
    ) -> Result<Option<RecordId>> {
        if self.mapped_hidden.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_mapped(table, resource_id).await
    }

    async fn insert_mapped(&self, record: &MappedRecord) -> Result<InsertOutcome<RecordId>> {
        self.inner.insert_mapped(record).await
    }

    async fn list_mapped(&self, user_id: PatientId) -> Result<Vec<MappedRecord>> {
        self.inner.list_mapped(user_id).await
    }

    async fn table_counts(&self, user_id: Option<PatientId>) -> Result<TableCounts> {
        self.inner.table_counts(user_id).await
    }

    async fn delete_all(&self) -> Result<TableCounts> {
        self.inner.delete_all().await
    }
}

#[tokio::test]
async fn test_lost_race_resolves_to_existing_rows() {
    let request = IngestRequest::new("hash-race", Some("Yoon".to_string()), immunization("im-1"));

    // Commit the request once, then replay it through lookups that miss
    let inner = Arc::new(MemoryStore::new());
    let original = coordinator_over(inner.clone()).ingest(&request).await.unwrap();
    let racing = Arc::new(RacingStore::new(inner));

    let report = coordinator_over(racing.clone())
        .ingest_with_report(&request)
        .await
        .unwrap();

    assert_eq!(report.response, original);
    assert!(!report.summary.identity_created);
    assert_eq!(report.summary.duplicate_resources, 1);
    assert_eq!(report.summary.mapped_existing, 1);

    let counts = racing.table_counts(None).await.unwrap();
    assert_eq!(counts.users, 1);
    assert_eq!(counts.fhir_resources, 1);
    assert_eq!(counts.immunizations, 1);
}

/// Fails every mapped insert
struct FailingMappedStore {
    inner: MemoryStore,
}

#[async_trait]
impl FhirStore for FailingMappedStore {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn find_user(&self, name_hash: &NameHash) -> Result<Option<PatientIdentity>> {
        self.inner.find_user(name_hash).await
    }

    async fn insert_user(
        &self,
        name_hash: &NameHash,
        full_name: Option<&str>,
    ) -> Result<InsertOutcome<PatientId>> {
        self.inner.insert_user(name_hash, full_name).await
    }

    async fn find_resource(&self, user_id: PatientId, fhir_id: &str) -> Result<Option<ResourceId>> {
        self.inner.find_resource(user_id, fhir_id).await
    }

    async fn insert_resource(&self, resource: &NewResource) -> Result<InsertOutcome<ResourceId>> {
        self.inner.insert_resource(resource).await
    }

    async fn list_resources(&self, user_id: PatientId) -> Result<Vec<StoredResource>> {
        self.inner.list_resources(user_id).await
    }

    async fn find_mapped(
        &self,
        table: MappedTable,
        resource_id: ResourceId,
    ) -> Result<Option<RecordId>> {
        self.inner.find_mapped(table, resource_id).await
    }

    async fn insert_mapped(&self, record: &MappedRecord) -> Result<InsertOutcome<RecordId>> {
        Err(StoreError::insert(record.table().name(), "disk full").into())
    }

    async fn list_mapped(&self, user_id: PatientId) -> Result<Vec<MappedRecord>> {
        self.inner.list_mapped(user_id).await
    }

    async fn table_counts(&self, user_id: Option<PatientId>) -> Result<TableCounts> {
        self.inner.table_counts(user_id).await
    }

    async fn delete_all(&self) -> Result<TableCounts> {
        self.inner.delete_all().await
    }
}

#[tokio::test]
async fn test_store_failure_propagates_and_keeps_earlier_writes() {
    let store = Arc::new(FailingMappedStore {
        inner: MemoryStore::new(),
    });
    let coordinator = coordinator_over(store.clone());
    let request = IngestRequest::new(
        "hash-fail",
        None,
        envelope(vec![patient("900101-1"), immunization("im-1"), immunization("im-2")]),
    );

    let err = coordinator.ingest(&request).await.unwrap_err();
    assert!(matches!(
        err,
        IngestError::Store(StoreError::InsertFailed { ref table, .. }) if table == "immunizations"
    ));

    // Identity, the Patient and the first Immunization were committed
    let counts = store.table_counts(None).await.unwrap();
    assert_eq!(counts.users, 1);
    assert_eq!(counts.fhir_resources, 2);
    assert_eq!(counts.mapped_total(), 0);
}
