//! Ingestion request and response documents
//!
//! These are the shapes exchanged with whatever front end feeds the engine
//! (the CLI here, an HTTP layer elsewhere).

use super::errors::IngestError;
use super::ids::{NameHash, PatientId, ResourceId};
use super::resource_type::ResourceType;
use super::result::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ingestion request as received from the caller
///
/// ```json
/// {"name_hash": "3f2a9c", "full_name": "Hong Gildong", "resource": {"publicData": [...]}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Opaque patient hash
    pub name_hash: String,

    /// Display name, only used when the identity is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Envelope or single resource
    pub resource: Value,
}

impl IngestRequest {
    /// Creates a request
    pub fn new(name_hash: impl Into<String>, full_name: Option<String>, resource: Value) -> Self {
        Self {
            name_hash: name_hash.into(),
            full_name,
            resource,
        }
    }

    /// Parses a request from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validates the request before any store access
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Validation`] for a blank `name_hash` or a
    /// `resource` that is not a JSON object.
    pub fn validated_hash(&self) -> Result<NameHash> {
        let hash = NameHash::new(self.name_hash.as_str()).map_err(IngestError::Validation)?;
        if !self.resource.is_object() {
            return Err(IngestError::Validation(
                "resource must be a JSON object".to_string(),
            ));
        }
        Ok(hash)
    }

    /// Display name with blank values treated as absent
    pub fn display_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// One dispatched resource in an ingestion response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResultEntry {
    pub resource_type: ResourceType,
    pub resource_id: ResourceId,
}

/// Ingestion response
///
/// ```json
/// {"status": "success", "user_id": 1, "results": [{"resource_type": "Immunization", "resource_id": 4}]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub status: String,
    pub user_id: PatientId,
    pub results: Vec<IngestResultEntry>,
}

impl IngestResponse {
    /// Creates a successful response
    pub fn success(user_id: PatientId, results: Vec<IngestResultEntry>) -> Self {
        Self {
            status: "success".to_string(),
            user_id,
            results,
        }
    }
}
