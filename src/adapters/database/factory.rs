//! Store factory
//!
//! This module provides the factory function that creates a store backend
//! based on configuration.

use crate::adapters::database::traits::FhirStore;
use crate::adapters::memory::MemoryStore;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{DatabaseTarget, IngestConfig};
use crate::domain::{IngestError, Result};
use std::sync::Arc;

/// Create a store based on the configuration
///
/// Dry-run mode always yields a fresh [`MemoryStore`], whatever the target.
/// For PostgreSQL the embedded schema is applied when
/// `postgresql.run_migrations` is set.
///
/// # Errors
///
/// Returns an error if the PostgreSQL section is missing, the pool cannot be
/// built or the schema cannot be applied.
pub async fn create_store(config: &IngestConfig) -> Result<Arc<dyn FhirStore>> {
    if config.application.dry_run {
        tracing::info!("DRY RUN: using in-memory store, nothing will be persisted");
        return Ok(Arc::new(MemoryStore::new()));
    }

    match config.database_target {
        DatabaseTarget::Memory => {
            tracing::info!("Creating in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                IngestError::Configuration(
                    "postgresql configuration is required when database_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL store");
            let client = PostgreSQLClient::new(pg_config.clone())?;
            tracing::debug!(
                target_db = %client.connection_string_safe(),
                "PostgreSQL pool created"
            );

            if pg_config.run_migrations {
                client.ensure_schema().await?;
            }

            Ok(Arc::new(PostgreSQLAdapter::new(client)))
        }
    }
}
