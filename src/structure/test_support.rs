//! In-memory catalog surface for analyzer tests.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::database::{CatalogSurface, DatabaseType};
use crate::db::models::{CatalogColumn, CatalogForeignKey, CatalogTable, ColumnRef, TypeAffinity};
use crate::error::{Result, StructureError};

pub fn col(name: &str, declared_type: &str) -> CatalogColumn {
    CatalogColumn {
        name: name.to_string(),
        declared_type: declared_type.to_string(),
        nullable: true,
        pk_position: 0,
    }
}

pub fn not_null(name: &str, declared_type: &str) -> CatalogColumn {
    CatalogColumn {
        nullable: false,
        ..col(name, declared_type)
    }
}

pub fn pk_col(name: &str, declared_type: &str, position: i64) -> CatalogColumn {
    CatalogColumn {
        nullable: false,
        pk_position: position,
        ..col(name, declared_type)
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    tables: Vec<CatalogTable>,
    columns: HashMap<String, Vec<CatalogColumn>>,
    foreign_keys: HashMap<String, Vec<CatalogForeignKey>>,
    no_row_ids: bool,
    failing: bool,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, name: &str, columns: Vec<CatalogColumn>) -> Self {
        self.tables.push(CatalogTable {
            name: name.to_string(),
            without_row_id: false,
        });
        self.columns.insert(name.to_string(), columns);
        self
    }

    pub fn without_rowid_table(mut self, name: &str, columns: Vec<CatalogColumn>) -> Self {
        self.tables.push(CatalogTable {
            name: name.to_string(),
            without_row_id: true,
        });
        self.columns.insert(name.to_string(), columns);
        self
    }

    /// Listed by `list_tables` but with no columns left
    pub fn dropped_table(mut self, name: &str) -> Self {
        self.tables.push(CatalogTable {
            name: name.to_string(),
            without_row_id: false,
        });
        self
    }

    pub fn foreign_key(
        mut self,
        table: &str,
        constraint_id: i64,
        seq: i64,
        from: &str,
        target_table: &str,
        target_column: Option<&str>,
    ) -> Self {
        self.foreign_keys
            .entry(table.to_string())
            .or_default()
            .push(CatalogForeignKey {
                constraint_id,
                seq,
                from_column: from.to_string(),
                target_table: target_table.to_string(),
                target_column: target_column.map(str::to_string),
            });
        self
    }

    pub fn without_row_ids(mut self) -> Self {
        self.no_row_ids = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            return Err(StructureError::Connectivity(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogSurface for FakeCatalog {
    fn engine(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    async fn list_tables(&self) -> Result<Vec<CatalogTable>> {
        self.check()?;
        Ok(self.tables.clone())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<CatalogColumn>> {
        self.check()?;
        Ok(self.columns.get(table).cloned().unwrap_or_default())
    }

    async fn list_foreign_keys(&self, table: &str) -> Result<Vec<CatalogForeignKey>> {
        self.check()?;
        Ok(self.foreign_keys.get(table).cloned().unwrap_or_default())
    }

    fn row_identifier(
        &self,
        table: &CatalogTable,
        _columns: &[CatalogColumn],
    ) -> Option<ColumnRef> {
        if self.no_row_ids || table.without_row_id {
            return None;
        }
        Some(ColumnRef {
            name: "rowid".to_string(),
            declared_type: "INTEGER".to_string(),
            affinity: TypeAffinity::Integer,
        })
    }
}
