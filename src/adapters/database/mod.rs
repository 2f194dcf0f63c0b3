//! Store abstraction layer
//!
//! This module provides a trait-based abstraction for the relational store,
//! allowing fhir-ingest to run against PostgreSQL or an in-memory backend.

pub mod factory;
pub mod traits;

pub use factory::create_store;
pub use traits::{FhirStore, InsertOutcome};
