use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, trace};

use super::affinity;
use crate::database::CatalogSurface;
use crate::db::models::{
    CatalogColumn, CatalogForeignKey, CatalogTable, Relationship, RelationshipKey,
};
use crate::error::{Result, StructureError};

/// Suffix appended to every relationship id
const RELATIONSHIP_ID_SUFFIX: &str = "fkey";

/// Column listings fetched at most once per table for the whole extraction.
struct ColumnCache<'a> {
    catalog: &'a dyn CatalogSurface,
    columns: HashMap<String, Arc<Vec<CatalogColumn>>>,
}

impl<'a> ColumnCache<'a> {
    fn new(catalog: &'a dyn CatalogSurface) -> Self {
        Self {
            catalog,
            columns: HashMap::new(),
        }
    }

    async fn get(&mut self, table: &str) -> Result<Arc<Vec<CatalogColumn>>> {
        if let Some(columns) = self.columns.get(table) {
            return Ok(columns.clone());
        }
        let columns = Arc::new(self.catalog.list_columns(table).await?);
        self.columns.insert(table.to_string(), columns.clone());
        Ok(columns)
    }
}

/// Extract every catalog-declared foreign key as a [`Relationship`].
///
/// Multi-column constraints are reassembled by constraint id; columns keep
/// the catalog's sequence order. Self references and chains are emitted
/// as-is, ordering them is left to the consumer.
pub async fn extract_relationships(catalog: &dyn CatalogSurface) -> Result<Vec<Relationship>> {
    let mut tables = catalog.list_tables().await?;
    tables.sort_by(|a, b| a.name.cmp(&b.name));

    let mut cache = ColumnCache::new(catalog);
    let mut relationships = Vec::new();

    for table in &tables {
        let rows = catalog.list_foreign_keys(&table.name).await?;
        if rows.is_empty() {
            continue;
        }

        let source_columns = cache.get(&table.name).await?;
        if source_columns.is_empty() {
            debug!(table = %table.name, "table dropped during extraction, skipping");
            continue;
        }

        for (constraint_id, mut group) in group_by_constraint(rows) {
            group.sort_by_key(|row| row.seq);
            let relationship = build_relationship(
                &mut cache,
                &tables,
                &table.name,
                &source_columns,
                constraint_id,
                group,
            )
            .await?;
            trace!(id = %relationship.id, target = %relationship.target_table, "relationship built");
            relationships.push(relationship);
        }
    }

    debug!(
        engine = catalog.engine().as_str(),
        count = relationships.len(),
        "relationships extracted"
    );
    Ok(relationships)
}

fn group_by_constraint(rows: Vec<CatalogForeignKey>) -> BTreeMap<i64, Vec<CatalogForeignKey>> {
    let mut groups: BTreeMap<i64, Vec<CatalogForeignKey>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.constraint_id).or_default().push(row);
    }
    groups
}

/// `<fkTable>_<col1>_..._<colN>_fkey`
pub fn relationship_id<S: AsRef<str>>(fk_table: &str, fk_columns: &[S]) -> String {
    let mut id = String::from(fk_table);
    for column in fk_columns {
        id.push('_');
        id.push_str(column.as_ref());
    }
    id.push('_');
    id.push_str(RELATIONSHIP_ID_SUFFIX);
    id
}

/// Catalog spelling of a referenced table. Constraints may name their
/// target in any case, the engine resolves it case-insensitively.
fn canonical_table<'t>(tables: &'t [CatalogTable], name: &'t str) -> &'t str {
    tables
        .iter()
        .find(|t| t.name == name)
        .or_else(|| tables.iter().find(|t| t.name.eq_ignore_ascii_case(name)))
        .map(|t| t.name.as_str())
        .unwrap_or(name)
}

fn find_column<'c>(columns: &'c [CatalogColumn], name: &str) -> Option<&'c CatalogColumn> {
    // Identifiers in a constraint may differ in case from the column definition
    columns
        .iter()
        .find(|c| c.name == name)
        .or_else(|| columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
}

async fn build_relationship(
    cache: &mut ColumnCache<'_>,
    tables: &[CatalogTable],
    fk_table: &str,
    source_columns: &[CatalogColumn],
    constraint_id: i64,
    group: Vec<CatalogForeignKey>,
) -> Result<Relationship> {
    let target_table = match group.first() {
        Some(row) => canonical_table(tables, &row.target_table).to_string(),
        None => {
            return Err(StructureError::malformed_constraint(
                fk_table,
                constraint_id,
                "constraint has no columns",
            ))
        }
    };
    if let Some(row) = group
        .iter()
        .find(|r| canonical_table(tables, &r.target_table) != target_table)
    {
        return Err(StructureError::malformed_constraint(
            fk_table,
            constraint_id,
            format!(
                "constraint targets both '{}' and '{}'",
                target_table, row.target_table
            ),
        ));
    }

    let target_columns = cache.get(&target_table).await?;
    if target_columns.is_empty() {
        return Err(StructureError::malformed_constraint(
            fk_table,
            constraint_id,
            format!("target table '{}' does not exist", target_table),
        ));
    }

    // Only consulted when the constraint omits its target column list
    let mut target_key: Vec<&CatalogColumn> =
        target_columns.iter().filter(|c| c.pk_position > 0).collect();
    target_key.sort_by_key(|c| c.pk_position);

    let mut keys = Vec::with_capacity(group.len());
    for (position, row) in group.iter().enumerate() {
        let source = find_column(source_columns, &row.from_column).ok_or_else(|| {
            StructureError::malformed_constraint(
                fk_table,
                constraint_id,
                format!("column '{}' does not exist", row.from_column),
            )
        })?;

        let target = match &row.target_column {
            Some(name) => find_column(&target_columns, name),
            None => target_key.get(position).copied(),
        }
        .ok_or_else(|| {
            StructureError::malformed_constraint(
                fk_table,
                constraint_id,
                format!(
                    "no target column '{}' on '{}'",
                    row.target_column.as_deref().unwrap_or("<primary key>"),
                    target_table
                ),
            )
        })?;

        keys.push(RelationshipKey {
            fk_column: source.name.clone(),
            fk_type: source.declared_type.clone(),
            fk_affinity: affinity::resolve(&source.declared_type),
            nullable: source.nullable,
            target_column: target.name.clone(),
            target_type: target.declared_type.clone(),
            target_affinity: affinity::resolve(&target.declared_type),
        });
    }

    let fk_columns: Vec<&str> = keys.iter().map(|k| k.fk_column.as_str()).collect();
    Ok(Relationship {
        id: relationship_id(fk_table, &fk_columns),
        fk_table: fk_table.to_string(),
        target_table,
        keys,
    })
}
