use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{CatalogSurface, DatabaseType};
use crate::database::queries::postgres::{
    COLUMNS_QUERY, FOREIGN_KEYS_QUERY, SNAPSHOT_ISOLATION, SNAPSHOT_QUERY, TABLES_QUERY,
};
use crate::db::models::{CatalogColumn, CatalogForeignKey, CatalogTable, ColumnRef};
use crate::error::{Result, StructureError};
use crate::structure::affinity;

/// Catalog surface backed by the `pg_catalog` relations of one schema.
///
/// All reads share one REPEATABLE READ transaction, so the catalog cannot
/// shift between the table listing and the per-table lookups.
pub struct PostgresCatalog {
    tx: Mutex<Transaction<'static, Postgres>>,
    schema: String,
}

impl PostgresCatalog {
    /// Acquire a connection and open a read-only snapshot on it.
    pub async fn begin(pool: &PgPool, schema: impl Into<String>) -> Result<Self> {
        let mut tx = pool
            .begin()
            .await
            .inspect_err(|e| Self::log_connection_error("begin", e))?;
        sqlx::query(SNAPSHOT_ISOLATION).execute(&mut *tx).await?;
        // The snapshot is fixed by the first statement after SET TRANSACTION
        sqlx::query(SNAPSHOT_QUERY).fetch_one(&mut *tx).await?;

        Ok(Self {
            tx: Mutex::new(tx),
            schema: schema.into(),
        })
    }

    /// End the read transaction and hand the connection back to the pool.
    pub async fn finish(self) -> Result<()> {
        self.tx.into_inner().rollback().await?;
        Ok(())
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    fn log_connection_error(context: &str, error: &sqlx::Error) {
        let error_str = error.to_string();
        if error_str.contains("Connection reset by peer")
            || error_str.contains("broken pipe")
            || error_str.contains("connection closed")
        {
            warn!(context, error = %error_str, "postgres connection lost");
        }
    }
}

#[async_trait]
impl CatalogSurface for PostgresCatalog {
    fn engine(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    async fn list_tables(&self) -> Result<Vec<CatalogTable>> {
        let mut tx = self.tx.lock().await;
        let tables = sqlx::query_as::<_, (String,)>(TABLES_QUERY)
            .bind(&self.schema)
            .fetch_all(&mut **tx)
            .await
            .inspect_err(|e| Self::log_connection_error("list_tables", e))?;

        debug!(schema = %self.schema, count = tables.len(), "listed postgres tables");

        Ok(tables
            .into_iter()
            .map(|(name,)| CatalogTable {
                name,
                without_row_id: false,
            })
            .collect())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<CatalogColumn>> {
        let mut tx = self.tx.lock().await;
        let columns = sqlx::query_as::<_, (String, String, bool, i64)>(COLUMNS_QUERY)
            .bind(&self.schema)
            .bind(table)
            .fetch_all(&mut **tx)
            .await
            .inspect_err(|e| Self::log_connection_error("list_columns", e))?;

        Ok(columns
            .into_iter()
            .map(
                |(name, declared_type, nullable, pk_position)| CatalogColumn {
                    name,
                    declared_type,
                    nullable,
                    pk_position,
                },
            )
            .collect())
    }

    async fn list_foreign_keys(&self, table: &str) -> Result<Vec<CatalogForeignKey>> {
        let mut tx = self.tx.lock().await;
        let foreign_keys = sqlx::query_as::<_, (i64, i64, String, String, String, String)>(
            FOREIGN_KEYS_QUERY,
        )
        .bind(&self.schema)
        .bind(table)
        .fetch_all(&mut **tx)
        .await
        .inspect_err(|e| Self::log_connection_error("list_foreign_keys", e))?;

        foreign_keys
            .into_iter()
            .map(
                |(constraint_id, seq, from_column, target_schema, target_table, target_column)| {
                    // The model keys tables by bare name, so a target in another
                    // schema cannot be represented
                    if target_schema != self.schema {
                        return Err(StructureError::malformed_constraint(
                            table,
                            constraint_id,
                            format!(
                                "foreign key references '{}.{}' outside schema '{}'",
                                target_schema, target_table, self.schema
                            ),
                        ));
                    }
                    Ok(CatalogForeignKey {
                        constraint_id,
                        seq,
                        from_column,
                        target_table,
                        target_column: Some(target_column),
                    })
                },
            )
            .collect()
    }

    fn row_identifier(
        &self,
        _table: &CatalogTable, // every heap table carries a ctid
        _columns: &[CatalogColumn],
    ) -> Option<ColumnRef> {
        Some(ColumnRef {
            name: "ctid".to_string(),
            declared_type: "tid".to_string(),
            affinity: affinity::resolve("tid"),
        })
    }
}
