//! PostgreSQL store backend
//!
//! This module provides the PostgreSQL implementation of the store trait.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
