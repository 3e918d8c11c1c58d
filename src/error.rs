//! Error types for structure extraction.

use thiserror::Error;

/// Main error type for catalog reads and structure extraction.
#[derive(Error, Debug)]
pub enum StructureError {
    /// Catalog unreachable or a catalog statement was rejected
    #[error("Connectivity error: {0}")]
    Connectivity(#[from] sqlx::Error),

    /// The connection provider gave up opening a connection
    #[error("Connection timed out after {secs} seconds")]
    ConnectTimeout { secs: u64 },

    /// A catalog row violates an assumption the analyzers rely on
    #[error("Malformed catalog for table {table}{}: {message}", constraint_suffix(.constraint))]
    MalformedCatalog {
        table: String,
        constraint: Option<String>,
        message: String,
    },

    /// Invalid connection URL or unsupported engine
    #[error("Configuration error: {0}")]
    Config(String),

    /// Structure model could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn constraint_suffix(constraint: &Option<String>) -> String {
    match constraint {
        Some(id) => format!(" (constraint {})", id),
        None => String::new(),
    }
}

impl StructureError {
    /// Create a MalformedCatalog error scoped to a table
    pub fn malformed(table: impl Into<String>, message: impl Into<String>) -> Self {
        StructureError::MalformedCatalog {
            table: table.into(),
            constraint: None,
            message: message.into(),
        }
    }

    /// Create a MalformedCatalog error scoped to one foreign-key constraint
    pub fn malformed_constraint(
        table: impl Into<String>,
        constraint: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        StructureError::MalformedCatalog {
            table: table.into(),
            constraint: Some(constraint.to_string()),
            message: message.into(),
        }
    }

    /// True for every error that means the catalog could not be queried.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            StructureError::Connectivity(_) | StructureError::ConnectTimeout { .. }
        )
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for structure extraction.
pub type Result<T> = std::result::Result<T, StructureError>;
