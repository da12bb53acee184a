//! Error types for scaffolding runs
//!
//! Each stage of a run has its own error enum; [`ScaffoldError`] is what a
//! full run returns. The boolean entry points in [`crate::generator`] log
//! these and never hand them to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read the schema from the database.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The connection string was rejected before any network traffic
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// TCP connect or TDS login failed
    #[error("Could not connect to SQL Server: {0}")]
    Connect(String),

    /// The catalog query (or the state query) failed to execute
    #[error("Catalog query failed: {0}")]
    Query(String),

    /// `sys.databases` has no row for the requested database
    #[error("Database '{0}' does not exist")]
    DatabaseNotFound(String),

    /// The database exists but is not `ONLINE`
    #[error("Database '{database}' is not online (state: {state})")]
    DatabaseOffline { database: String, state: String },

    /// A catalog row was missing a required column value
    #[error("Malformed catalog row: {0}")]
    MalformedRow(String),
}

impl From<tiberius::error::Error> for ExtractionError {
    fn from(err: tiberius::error::Error) -> Self {
        ExtractionError::Query(err.to_string())
    }
}

/// Failure of an [`crate::store::ArtifactStore`] operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not prepare artifact directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not list artifacts in {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read artifact {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write artifact {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not delete artifact {name}: {source}")]
    Delete {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact {0} not found")]
    NotFound(String),
}

/// Top-level error of a generation run.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A model, index or context artifact could not be written. Aborts the run.
    #[error("Artifact write failed: {0}")]
    ArtifactWrite(#[source] StoreError),

    /// Listing the destination before synchronisation failed.
    #[error("Artifact store unavailable: {0}")]
    Store(#[source] StoreError),
}

/// A failed delete of one obsolete artifact. Recorded, never fatal.
#[derive(Debug, Error)]
#[error("Could not delete obsolete artifact {file_name}: {reason}")]
pub struct StaleArtifactCleanupError {
    pub file_name: String,
    pub reason: String,
}

pub type Result<T> = std::result::Result<T, ScaffoldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_display() {
        let err = ExtractionError::DatabaseOffline {
            database: "Sales".to_string(),
            state: "OFFLINE".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("Sales"));
        assert!(display.contains("OFFLINE"));
    }

    #[test]
    fn test_scaffold_error_wraps_extraction() {
        let err: ScaffoldError = ExtractionError::DatabaseNotFound("Gone".to_string()).into();
        assert_eq!(err.to_string(), "Database 'Gone' does not exist");
    }

    #[test]
    fn test_cleanup_error_display() {
        let err = StaleArtifactCleanupError {
            file_name: "OrdersModel.cs".to_string(),
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("OrdersModel.cs"));
        assert!(err.to_string().contains("permission denied"));
    }
}
