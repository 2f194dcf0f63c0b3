//! PostgreSQL client implementation
//!
//! This module provides the pooled client for interacting with PostgreSQL.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{IngestError, Result, StoreError};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

/// Schema applied by [`PostgreSQLClient::ensure_schema`]
const INITIAL_SCHEMA: &str = include_str!("../../../migrations/001_initial_schema.sql");

/// PostgreSQL client for fhir-ingest
///
/// Provides methods for connecting to PostgreSQL, applying the schema and
/// running statements using connection pooling.
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Configuration
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// Connections are opened lazily; use [`test_connection`](Self::test_connection)
    /// to fail fast.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid or the pool cannot be built.
    pub fn new(config: PostgreSQLConfig) -> Result<Self> {
        let pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .parse()
            .map_err(|e| {
                IngestError::Configuration(format!("Invalid PostgreSQL connection string: {}", e))
            })?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| {
                StoreError::ConnectionFailed(format!("Failed to create connection pool: {}", e))
            })?;

        Ok(Self { pool, config })
    }

    /// Test the connection to PostgreSQL
    ///
    /// Attempts to get a connection from the pool and execute a simple query.
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client.query_one("SELECT 1", &[]).await.map_err(|e| {
            StoreError::ConnectionFailed(format!("Connection test failed: {}", e))
        })?;

        tracing::info!("PostgreSQL connection test successful");
        Ok(())
    }

    /// Ensure the schema exists
    ///
    /// Runs the embedded migration, which only uses `IF NOT EXISTS` statements.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub async fn ensure_schema(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .batch_execute(INITIAL_SCHEMA)
            .await
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;

        tracing::info!("PostgreSQL schema initialized successfully");
        Ok(())
    }

    /// Get a connection from the pool with the statement timeout applied
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be obtained.
    pub async fn get_connection(&self) -> Result<Object> {
        let client = self.pool.get().await.map_err(|e| {
            StoreError::ConnectionFailed(format!("Failed to get connection from pool: {}", e))
        })?;

        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client.batch_execute(&timeout_query).await.map_err(|e| {
            StoreError::ConnectionFailed(format!("Failed to set statement timeout: {}", e))
        })?;

        Ok(client)
    }

    /// Execute a query and return rows
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::QueryFailed`] labelled with `table` if the query fails.
    pub async fn query(
        &self,
        table: &str,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>> {
        let client = self.get_connection().await?;

        client
            .query(query, params)
            .await
            .map_err(|e| StoreError::query(table, e).into())
    }

    /// Execute an `INSERT ... ON CONFLICT DO NOTHING RETURNING id`
    ///
    /// Returns `None` when the insert was skipped because of a conflict.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InsertFailed`] labelled with `table` for any other failure.
    pub async fn insert_returning_id(
        &self,
        table: &str,
        statement: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<i64>> {
        let client = self.get_connection().await?;

        let row = client
            .query_opt(statement, params)
            .await
            .map_err(|e| StoreError::insert(table, e))?;

        match row {
            Some(row) => row
                .try_get::<_, i64>("id")
                .map(Some)
                .map_err(|e| StoreError::insert(table, e).into()),
            None => Ok(None),
        }
    }

    /// Get the connection string (without password)
    pub fn connection_string_safe(&self) -> String {
        let conn_str: &str = self.config.connection_string.expose_secret().as_ref();
        match conn_str.rsplit_once('@') {
            Some((_, host)) => format!("postgresql://***@{}", host),
            None => "postgresql://***".to_string(),
        }
    }
}
