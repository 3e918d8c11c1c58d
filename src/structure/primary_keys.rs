use tracing::{debug, trace};

use super::affinity;
use crate::database::CatalogSurface;
use crate::db::models::{CatalogColumn, CatalogTable, ColumnRef, PrimaryKey};
use crate::error::{Result, StructureError};

/// Extract one primary key per user table, ordered by table name.
///
/// A table that is listed but has vanished by the time its columns are read
/// is left out of the result.
pub async fn extract_primary_keys(catalog: &dyn CatalogSurface) -> Result<Vec<PrimaryKey>> {
    let mut tables = catalog.list_tables().await?;
    // Byte order, independent of the engine's collation
    tables.sort_by(|a, b| a.name.cmp(&b.name));

    let mut primary_keys = Vec::with_capacity(tables.len());
    for table in &tables {
        let columns = catalog.list_columns(&table.name).await?;
        if columns.is_empty() {
            debug!(table = %table.name, "table dropped during extraction, skipping");
            continue;
        }
        primary_keys.push(primary_key_for(catalog, table, &columns)?);
    }

    debug!(engine = catalog.engine().as_str(), count = primary_keys.len(), "primary keys extracted");
    Ok(primary_keys)
}

/// Resolve the key of a single table from its column listing.
pub fn primary_key_for(
    catalog: &dyn CatalogSurface,
    table: &CatalogTable,
    columns: &[CatalogColumn],
) -> Result<PrimaryKey> {
    let mut declared: Vec<&CatalogColumn> =
        columns.iter().filter(|c| c.pk_position > 0).collect();
    declared.sort_by_key(|c| c.pk_position);

    let keys = if !declared.is_empty() {
        trace!(
            table = %table.name,
            without_row_id = table.without_row_id,
            columns = declared.len(),
            "using declared primary key"
        );
        declared
            .into_iter()
            .map(|c| ColumnRef {
                name: c.name.clone(),
                declared_type: c.declared_type.clone(),
                affinity: affinity::resolve(&c.declared_type),
            })
            .collect()
    } else if table.without_row_id {
        return Err(StructureError::malformed(
            &table.name,
            "WITHOUT ROWID table reports no primary key columns",
        ));
    } else {
        let row_id = catalog.row_identifier(table, columns).ok_or_else(|| {
            StructureError::malformed(
                &table.name,
                "no declared primary key and no usable row identifier",
            )
        })?;
        trace!(table = %table.name, key = %row_id.name, "falling back to row identifier");
        vec![row_id]
    };

    Ok(PrimaryKey {
        table_id: table.name.clone(),
        table: table.name.clone(),
        keys,
        dirty: false,
    })
}
