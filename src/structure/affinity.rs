//! Declared type text to storage affinity.
//!
//! Rules are checked in order and the first match wins, mirroring the
//! affinity cascade of dynamically-typed SQL engines.

use crate::db::models::TypeAffinity;

/// Resolve the affinity of a declared column type. Never fails.
pub fn resolve(declared_type: &str) -> TypeAffinity {
    let upper = declared_type.to_uppercase();

    if upper.contains("INT") {
        TypeAffinity::Integer
    } else if ["CHAR", "CLOB", "TEXT"].iter().any(|t| upper.contains(t)) {
        TypeAffinity::Text
    } else if upper.contains("BLOB") || upper.is_empty() {
        TypeAffinity::Blob
    } else if ["REAL", "FLOA", "DOUB"].iter().any(|t| upper.contains(t)) {
        TypeAffinity::Real
    } else {
        TypeAffinity::Numeric
    }
}
