//! Structure extraction and normalization.
//!
//! Two independent analyzers read the catalog surface and their outputs are
//! merged by table name into a [`StructureModel`].

pub mod affinity;
pub mod primary_keys;
pub mod relationships;

#[cfg(test)]
pub(crate) mod test_support;

use std::collections::BTreeMap;

pub use primary_keys::extract_primary_keys;
pub use relationships::{extract_relationships, relationship_id};

use crate::database::CatalogSurface;
use crate::db::models::{PrimaryKey, Relationship, StructureModel};
use crate::error::Result;

/// Run both analyzers against the same catalog and assemble the model.
///
/// The analyzers run concurrently; if either fails the whole extraction
/// fails and no partial model is returned.
pub async fn extract_structure(catalog: &dyn CatalogSurface) -> Result<StructureModel> {
    let (primary_keys, relationships) = tokio::try_join!(
        extract_primary_keys(catalog),
        extract_relationships(catalog)
    )?;
    Ok(StructureModel::from_parts(primary_keys, relationships))
}

impl StructureModel {
    pub fn from_parts(primary_keys: Vec<PrimaryKey>, relationships: Vec<Relationship>) -> Self {
        let primary_keys: BTreeMap<String, PrimaryKey> = primary_keys
            .into_iter()
            .map(|pk| (pk.table_id.clone(), pk))
            .collect();
        Self {
            primary_keys,
            relationships,
        }
    }

    pub fn primary_key(&self, table_id: &str) -> Option<&PrimaryKey> {
        self.primary_keys.get(table_id)
    }

    pub fn table_ids(&self) -> impl Iterator<Item = &str> {
        self.primary_keys.keys().map(String::as_str)
    }

    /// Relationships declared on `table` (it holds the foreign key)
    pub fn relationships_from<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships.iter().filter(move |r| r.fk_table == table)
    }

    /// Relationships pointing at `table`
    pub fn relationships_to<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships.iter().filter(move |r| r.target_table == table)
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    /// Distinct `(fk_table, target_table)` edges, sorted.
    ///
    /// Self references are kept; cycle handling belongs to the graph consumer.
    pub fn dependencies(&self) -> Vec<(&str, &str)> {
        let mut edges: Vec<(&str, &str)> = self
            .relationships
            .iter()
            .map(|r| (r.fk_table.as_str(), r.target_table.as_str()))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
