//! PostgreSQL adapter implementing the store trait
//!
//! Every insert is written as `ON CONFLICT DO NOTHING RETURNING id`, so a
//! natural-key collision comes back as an empty result rather than an error.

use crate::adapters::database::traits::{FhirStore, InsertOutcome};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{
    claim_from_row, identity_from_row, immunization_from_row, medication_from_row,
    resource_from_row,
};
use crate::domain::{
    MappedRecord, MappedTable, NameHash, NewResource, PatientId, PatientIdentity, RecordId,
    ResourceId, Result, StoreError, StoredResource, TableCounts,
};
use async_trait::async_trait;
use tokio_postgres::types::ToSql;

/// PostgreSQL implementation of [`FhirStore`]
pub struct PostgreSQLAdapter {
    client: PostgreSQLClient,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter
    pub fn new(client: PostgreSQLClient) -> Self {
        Self { client }
    }

    async fn count(&self, table: &str, user_id: Option<PatientId>) -> Result<u64> {
        let rows = match user_id {
            Some(user_id) => {
                let column = if table == "users" { "id" } else { "user_id" };
                let query = format!("SELECT COUNT(*) AS n FROM {table} WHERE {column} = $1");
                self.client.query(table, &query, &[&user_id.get()]).await?
            }
            None => {
                let query = format!("SELECT COUNT(*) AS n FROM {table}");
                self.client.query(table, &query, &[]).await?
            }
        };

        let count: i64 = rows
            .first()
            .map(|row| row.try_get::<_, i64>("n"))
            .transpose()
            .map_err(|e| StoreError::query(table, e))?
            .unwrap_or(0);
        Ok(count.max(0) as u64)
    }
}

fn outcome<T: From<i64>>(id: Option<i64>) -> InsertOutcome<T> {
    match id {
        Some(id) => InsertOutcome::Inserted(T::from(id)),
        None => InsertOutcome::Conflict,
    }
}

#[async_trait]
impl FhirStore for PostgreSQLAdapter {
    fn backend_name(&self) -> &'static str {
        "postgresql"
    }

    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_schema().await
    }

    async fn find_user(&self, name_hash: &NameHash) -> Result<Option<PatientIdentity>> {
        let rows = self
            .client
            .query(
                "users",
                "SELECT id, name_hash, full_name FROM users WHERE name_hash = $1",
                &[&name_hash.as_str()],
            )
            .await?;

        rows.first().map(identity_from_row).transpose()
    }

    async fn insert_user(
        &self,
        name_hash: &NameHash,
        full_name: Option<&str>,
    ) -> Result<InsertOutcome<PatientId>> {
        let id = self
            .client
            .insert_returning_id(
                "users",
                r#"
                INSERT INTO users (name_hash, full_name)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                RETURNING id
                "#,
                &[&name_hash.as_str(), &full_name],
            )
            .await?;
        Ok(outcome(id))
    }

    async fn find_resource(
        &self,
        user_id: PatientId,
        fhir_id: &str,
    ) -> Result<Option<ResourceId>> {
        let rows = self
            .client
            .query(
                "fhir_resources",
                "SELECT id FROM fhir_resources WHERE user_id = $1 AND fhir_id = $2",
                &[&user_id.get(), &fhir_id],
            )
            .await?;

        rows.first()
            .map(|row| row.try_get::<_, i64>("id").map(ResourceId::new))
            .transpose()
            .map_err(|e| StoreError::query("fhir_resources", e).into())
    }

    async fn insert_resource(&self, resource: &NewResource) -> Result<InsertOutcome<ResourceId>> {
        let id = self
            .client
            .insert_returning_id(
                "fhir_resources",
                r#"
                INSERT INTO fhir_resources (user_id, resource_type, fhir_id, data)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT DO NOTHING
                RETURNING id
                "#,
                &[
                    &resource.user_id.get(),
                    &resource.resource_type.as_str(),
                    &resource.fhir_id,
                    &resource.data,
                ],
            )
            .await?;
        Ok(outcome(id))
    }

    async fn list_resources(&self, user_id: PatientId) -> Result<Vec<StoredResource>> {
        let rows = self
            .client
            .query(
                "fhir_resources",
                r#"
                SELECT id, user_id, resource_type, fhir_id, data
                FROM fhir_resources
                WHERE user_id = $1
                ORDER BY id
                "#,
                &[&user_id.get()],
            )
            .await?;

        rows.iter().map(resource_from_row).collect()
    }

    async fn find_mapped(
        &self,
        table: MappedTable,
        resource_id: ResourceId,
    ) -> Result<Option<RecordId>> {
        let query = format!("SELECT id FROM {} WHERE resource_id = $1", table.name());
        let rows = self
            .client
            .query(table.name(), &query, &[&resource_id.get()])
            .await?;

        rows.first()
            .map(|row| row.try_get::<_, i64>("id").map(RecordId::new))
            .transpose()
            .map_err(|e| StoreError::query(table.name(), e).into())
    }

    async fn insert_mapped(&self, record: &MappedRecord) -> Result<InsertOutcome<RecordId>> {
        let table = record.table().name();
        let user_id = record.user_id().get();
        let resource_id = record.resource_id().get();

        let id = match record {
            MappedRecord::Medication(r) => {
                let params: [&(dyn ToSql + Sync); 8] = [
                    &user_id,
                    &resource_id,
                    &r.medication_code,
                    &r.medication_name,
                    &r.pharmacy_name,
                    &r.dispense_date,
                    &r.days_supply,
                    &r.age,
                ];
                self.client
                    .insert_returning_id(
                        table,
                        r#"
                        INSERT INTO medication_dispenses (
                            user_id, resource_id, medication_code, medication_name,
                            pharmacy_name, when_prepared, days_supply, age
                        )
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                        ON CONFLICT DO NOTHING
                        RETURNING id
                        "#,
                        &params,
                    )
                    .await?
            }
            MappedRecord::Claim(r) => {
                let params: [&(dyn ToSql + Sync); 6] = [
                    &user_id,
                    &resource_id,
                    &r.claim_type,
                    &r.claim_date,
                    &r.copay_amount,
                    &r.benefit_amount,
                ];
                self.client
                    .insert_returning_id(
                        table,
                        r#"
                        INSERT INTO treatment_claims (
                            user_id, resource_id, claim_type, created_date,
                            copay_amount, benefit_amount
                        )
                        VALUES ($1, $2, $3, $4, $5, $6)
                        ON CONFLICT DO NOTHING
                        RETURNING id
                        "#,
                        &params,
                    )
                    .await?
            }
            MappedRecord::Immunization(r) => {
                let params: [&(dyn ToSql + Sync); 6] = [
                    &user_id,
                    &resource_id,
                    &r.vaccine_name,
                    &r.occurrence_date,
                    &r.dose_number,
                    &r.performer_name,
                ];
                self.client
                    .insert_returning_id(
                        table,
                        r#"
                        INSERT INTO immunizations (
                            user_id, resource_id, vaccine_name, occurrence_date,
                            dose_number, performer_name
                        )
                        VALUES ($1, $2, $3, $4, $5, $6)
                        ON CONFLICT DO NOTHING
                        RETURNING id
                        "#,
                        &params,
                    )
                    .await?
            }
        };

        Ok(outcome(id))
    }

    async fn list_mapped(&self, user_id: PatientId) -> Result<Vec<MappedRecord>> {
        let mut records = Vec::new();

        for table in MappedTable::ALL {
            let query = format!(
                "SELECT * FROM {} WHERE user_id = $1 ORDER BY id",
                table.name()
            );
            let rows = self
                .client
                .query(table.name(), &query, &[&user_id.get()])
                .await?;

            let decode = match table {
                MappedTable::MedicationDispenses => medication_from_row,
                MappedTable::TreatmentClaims => claim_from_row,
                MappedTable::Immunizations => immunization_from_row,
            };
            for row in &rows {
                records.push(decode(row)?);
            }
        }

        Ok(records)
    }

    async fn table_counts(&self, user_id: Option<PatientId>) -> Result<TableCounts> {
        Ok(TableCounts {
            users: self.count("users", user_id).await?,
            fhir_resources: self.count("fhir_resources", user_id).await?,
            medication_dispenses: self.count("medication_dispenses", user_id).await?,
            treatment_claims: self.count("treatment_claims", user_id).await?,
            immunizations: self.count("immunizations", user_id).await?,
        })
    }

    async fn delete_all(&self) -> Result<TableCounts> {
        let mut client = self.client.get_connection().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| StoreError::delete("users", e))?;

        // Children before parents
        let mut deleted = TableCounts::default();
        for (table, slot) in [
            ("medication_dispenses", &mut deleted.medication_dispenses),
            ("treatment_claims", &mut deleted.treatment_claims),
            ("immunizations", &mut deleted.immunizations),
            ("fhir_resources", &mut deleted.fhir_resources),
            ("users", &mut deleted.users),
        ] {
            *slot = tx
                .execute(format!("DELETE FROM {table}").as_str(), &[])
                .await
                .map_err(|e| StoreError::delete(table, e))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::delete("users", e))?;

        tracing::warn!(
            users = deleted.users,
            fhir_resources = deleted.fhir_resources,
            mapped = deleted.mapped_total(),
            "Deleted all rows from PostgreSQL store"
        );
        Ok(deleted)
    }
}
