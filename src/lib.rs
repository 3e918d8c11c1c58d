//! Extracts a canonical, dialect-independent structure model (primary keys
//! and foreign-key relationships) from a live database.
//!
//! ```rust,ignore
//! let config = ConnectionConfig::from_url("sqlite:/data/app.db")?;
//! let model = extract_with(&config).await?;
//! for (from, to) in model.dependencies() {
//!     println!("{from} -> {to}");
//! }
//! ```

pub mod database;
pub mod db;
pub mod error;
pub mod structure;

pub use database::connection::{extract_with, CatalogSnapshot, Connection, ConnectionConfig};
pub use database::{CatalogSurface, DatabaseType, PostgresConfig, SqliteConfig};
pub use db::models::{
    ColumnRef, PrimaryKey, Relationship, RelationshipKey, StructureModel, TypeAffinity,
};
pub use error::{Result, StructureError};
pub use structure::{extract_primary_keys, extract_relationships, extract_structure};
