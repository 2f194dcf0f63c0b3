//! Resource unwrapping
//!
//! Ingestion payloads either wrap resources in a `publicData` envelope
//! (`{"publicData": [{"resource": {...}}, ...]}`) or are a single resource.

use serde_json::Value;

/// Name of the envelope array
pub const ENVELOPE_FIELD: &str = "publicData";

/// Flattens an ingestion payload into individual resources
///
/// Envelope elements that are not objects or lack a `resource` field are
/// dropped silently; order is preserved. A document without a `publicData`
/// array is returned as a one-element vector, unchanged.
///
/// ```
/// use fhir_ingest::core::unwrap::unwrap_resources;
/// use serde_json::json;
///
/// let payload = json!({"publicData": [
///     {"resource": {"resourceType": "Immunization", "id": "a"}},
///     {"unexpected": true},
///     {"resource": {"resourceType": "Patient", "id": "b"}}
/// ]});
/// let resources = unwrap_resources(&payload);
/// assert_eq!(resources.len(), 2);
/// assert_eq!(resources[1]["id"], "b");
/// ```
pub fn unwrap_resources(document: &Value) -> Vec<Value> {
    match document.get(ENVELOPE_FIELD).and_then(Value::as_array) {
        Some(entries) => {
            let resources: Vec<Value> = entries
                .iter()
                .filter_map(|entry| entry.as_object()?.get("resource").cloned())
                .collect();

            if resources.len() < entries.len() {
                tracing::debug!(
                    entries = entries.len(),
                    kept = resources.len(),
                    "Dropped malformed envelope entries"
                );
            }
            resources
        }
        None => vec![document.clone()],
    }
}
