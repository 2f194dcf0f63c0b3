//! In-memory store backend
//!
//! Keeps every table in process memory. Selected by `database_target = "memory"`
//! and always used in dry-run mode.

pub mod store;

pub use store::MemoryStore;
