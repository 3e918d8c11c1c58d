use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Storage-class category a declared column type maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeAffinity {
    Text,
    Numeric,
    Integer,
    Real,
    Blob,
}

impl TypeAffinity {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeAffinity::Text => "text",
            TypeAffinity::Numeric => "numeric",
            TypeAffinity::Integer => "integer",
            TypeAffinity::Real => "real",
            TypeAffinity::Blob => "blob",
        }
    }
}

impl std::fmt::Display for TypeAffinity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: String,
    pub affinity: TypeAffinity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKey {
    pub table_id: String,
    pub table: String,
    pub keys: Vec<ColumnRef>,
    /// Set by a caching layer once the underlying table has been altered.
    /// Extraction only ever initializes it to false.
    pub dirty: bool,
}

impl PrimaryKey {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn key_names(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipKey {
    pub fk_column: String,
    pub fk_type: String,
    pub fk_affinity: TypeAffinity,
    pub nullable: bool,
    pub target_column: String,
    pub target_type: String,
    pub target_affinity: TypeAffinity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub fk_table: String,
    pub target_table: String,
    pub keys: Vec<RelationshipKey>,
}

impl Relationship {
    pub fn is_self_referencing(&self) -> bool {
        self.fk_table == self.target_table
    }

    /// True when every fk column accepts NULL, so a row can exist without the parent.
    pub fn is_optional(&self) -> bool {
        !self.keys.is_empty() && self.keys.iter().all(|k| k.nullable)
    }
}

/// Canonical description of a database's tables, keys and relationships.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureModel {
    pub primary_keys: BTreeMap<String, PrimaryKey>,
    pub relationships: Vec<Relationship>,
}

// Raw catalog rows, as reported by a CatalogSurface adapter

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTable {
    pub name: String,
    pub without_row_id: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub name: String,
    /// Declared type text exactly as stored in the catalog
    pub declared_type: String,
    pub nullable: bool,
    /// 1-based position in the primary key, 0 when not part of it
    pub pk_position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogForeignKey {
    pub constraint_id: i64,
    pub seq: i64,
    pub from_column: String,
    pub target_table: String,
    /// None when the constraint references the target's primary key implicitly
    pub target_column: Option<String>,
}
