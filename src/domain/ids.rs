//! Domain identifier types
//!
//! Newtype wrappers keep store-assigned ids of different tables from being
//! mixed up, and validate the opaque patient name hash on construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque, stable patient hash supplied by the caller
///
/// # Examples
///
/// ```
/// use fhir_ingest::domain::ids::NameHash;
/// use std::str::FromStr;
///
/// let hash = NameHash::from_str("3f2a9c").unwrap();
/// assert_eq!(hash.as_str(), "3f2a9c");
/// assert!(NameHash::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameHash(String);

impl NameHash {
    /// Creates a new NameHash, rejecting blank values
    pub fn new(hash: impl Into<String>) -> Result<Self, String> {
        let hash = hash.into();
        if hash.trim().is_empty() {
            return Err("name_hash cannot be empty".to_string());
        }
        Ok(Self(hash))
    }

    /// Returns the hash as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NameHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for NameHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a store-assigned id
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw id
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

store_id!(
    /// Internal id of a row in `users`
    PatientId
);

store_id!(
    /// Internal id of a row in `fhir_resources`
    ResourceId
);

store_id!(
    /// Internal id of a row in one of the mapped tables
    RecordId
);
