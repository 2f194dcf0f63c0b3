//! Ingestion pipeline
//!
//! - [`identity`] - resolve or create the patient identity
//! - [`resources`] - store each raw resource at most once
//! - [`mapped`] - store each mapped record at most once
//! - [`coordinator`] - orchestrate one ingestion request
//!
//! Every "at most once" write follows the same shape: look up the natural key,
//! insert when absent, and re-read when the insert reports a conflict.

pub mod coordinator;
pub mod identity;
pub mod mapped;
pub mod resources;

pub use coordinator::{IngestCoordinator, IngestReport, IngestSummary};
pub use identity::IdentityResolver;
pub use mapped::MappedRecordStore;
pub use resources::ResourceStore;

/// Id of a row written at most once, and whether this call created it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stored<T> {
    pub id: T,
    pub created: bool,
}

impl<T> Stored<T> {
    /// Row created by this call
    pub fn created(id: T) -> Self {
        Self { id, created: true }
    }

    /// Row that already existed
    pub fn existing(id: T) -> Self {
        Self { id, created: false }
    }
}
