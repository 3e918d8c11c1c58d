use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;
use tracing::debug;

use super::{CatalogSurface, DatabaseType};
use crate::database::queries::sqlite::{
    COLUMNS_QUERY, FOREIGN_KEYS_QUERY, SNAPSHOT_QUERY, TABLES_QUERY,
};
use crate::db::models::{CatalogColumn, CatalogForeignKey, CatalogTable, ColumnRef, TypeAffinity};
use crate::error::{Result, StructureError};

/// Names SQLite accepts for the implicit row identifier, in lookup order
const ROW_ID_ALIASES: [&str; 3] = ["rowid", "_rowid_", "oid"];

/// Catalog surface backed by SQLite pragmas.
///
/// Every read goes through one deferred transaction on a single pooled
/// connection, so the whole extraction sees one schema snapshot.
pub struct SqliteCatalog {
    tx: Mutex<Transaction<'static, Sqlite>>,
}

impl SqliteCatalog {
    /// Acquire a connection and pin a read snapshot on it.
    pub async fn begin(pool: &SqlitePool) -> Result<Self> {
        let mut tx = pool.begin().await?;
        // A deferred BEGIN only takes its snapshot on the first read
        sqlx::query(SNAPSHOT_QUERY).fetch_one(&mut *tx).await?;
        Ok(Self { tx: Mutex::new(tx) })
    }

    /// End the read transaction and hand the connection back to the pool.
    pub async fn finish(self) -> Result<()> {
        self.tx.into_inner().rollback().await?;
        Ok(())
    }

    fn decode<T>(table: &str, row: &SqliteRow, column: &str) -> Result<T>
    where
        T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
    {
        row.try_get::<T, _>(column).map_err(|e| {
            StructureError::malformed(table, format!("cannot decode '{}': {}", column, e))
        })
    }
}

#[async_trait]
impl CatalogSurface for SqliteCatalog {
    fn engine(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    async fn list_tables(&self) -> Result<Vec<CatalogTable>> {
        let mut tx = self.tx.lock().await;
        let tables = sqlx::query_as::<_, (String, i64)>(TABLES_QUERY)
            .fetch_all(&mut **tx)
            .await?;

        debug!(count = tables.len(), "listed sqlite tables");

        Ok(tables
            .into_iter()
            .map(|(name, without_rowid)| CatalogTable {
                name,
                without_row_id: without_rowid != 0,
            })
            .collect())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<CatalogColumn>> {
        let mut tx = self.tx.lock().await;
        let rows = sqlx::query(COLUMNS_QUERY)
            .bind(table)
            .fetch_all(&mut **tx)
            .await?;

        rows.iter()
            .map(|row| {
                // `type` is empty (not NULL) for columns declared without one
                let declared_type: Option<String> = Self::decode(table, row, "data_type")?;
                let not_null: i64 = Self::decode(table, row, "not_null")?;
                Ok(CatalogColumn {
                    name: Self::decode(table, row, "column_name")?,
                    declared_type: declared_type.unwrap_or_default(),
                    nullable: not_null == 0,
                    pk_position: Self::decode(table, row, "pk_position")?,
                })
            })
            .collect()
    }

    async fn list_foreign_keys(&self, table: &str) -> Result<Vec<CatalogForeignKey>> {
        let mut tx = self.tx.lock().await;
        let rows = sqlx::query(FOREIGN_KEYS_QUERY)
            .bind(table)
            .fetch_all(&mut **tx)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(CatalogForeignKey {
                    constraint_id: Self::decode(table, row, "fk_id")?,
                    seq: Self::decode(table, row, "seq")?,
                    from_column: Self::decode(table, row, "column_name")?,
                    target_table: Self::decode(table, row, "references_table")?,
                    target_column: Self::decode(table, row, "references_column")?,
                })
            })
            .collect()
    }

    fn row_identifier(
        &self,
        table: &CatalogTable,
        columns: &[CatalogColumn],
    ) -> Option<ColumnRef> {
        if table.without_row_id {
            return None;
        }
        // A user column named like the row id hides it; fall through to the next alias
        ROW_ID_ALIASES
            .iter()
            .find(|alias| {
                !columns
                    .iter()
                    .any(|c| c.name.eq_ignore_ascii_case(alias))
            })
            .map(|alias| ColumnRef {
                name: alias.to_string(),
                declared_type: "INTEGER".to_string(),
                affinity: TypeAffinity::Integer,
            })
    }
}
