//! FHIR resource type tag
//!
//! The `resourceType` string of every incoming resource is parsed into this
//! enum before dispatch. Anything other than the three mapped types lands in
//! [`ResourceType::Other`] and is stored raw only.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Declared type of a FHIR resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    /// `MedicationDispense`
    MedicationDispense,
    /// `ExplanationOfBenefit`
    ExplanationOfBenefit,
    /// `Immunization`
    Immunization,
    /// Any other tag, kept verbatim (empty when the resource has none)
    Other(String),
}

impl ResourceType {
    /// Reads the `resourceType` field of a raw resource
    pub fn of(resource: &Value) -> Self {
        resource
            .get("resourceType")
            .and_then(Value::as_str)
            .map(Self::from)
            .unwrap_or_else(|| ResourceType::Other(String::new()))
    }

    /// Returns the FHIR tag
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::MedicationDispense => "MedicationDispense",
            ResourceType::ExplanationOfBenefit => "ExplanationOfBenefit",
            ResourceType::Immunization => "Immunization",
            ResourceType::Other(tag) => tag,
        }
    }
}

impl From<&str> for ResourceType {
    fn from(tag: &str) -> Self {
        match tag {
            "MedicationDispense" => ResourceType::MedicationDispense,
            "ExplanationOfBenefit" => ResourceType::ExplanationOfBenefit,
            "Immunization" => ResourceType::Immunization,
            other => ResourceType::Other(other.to_string()),
        }
    }
}

impl From<String> for ResourceType {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<ResourceType> for String {
    fn from(resource_type: ResourceType) -> Self {
        resource_type.as_str().to_string()
    }
}

impl FromStr for ResourceType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
