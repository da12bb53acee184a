//! # mssql-scaffold
//!
//! Scaffold ORM model sources from a live SQL Server schema.
//!
//! A run reads table and column definitions from the catalog views, maps each
//! column's SQL type to a target-language type, writes one model artifact per
//! table plus an index artifact, and removes artifacts for tables that no
//! longer exist (unless safe mode is on).
//!
//! ```no_run
//! use mssql_scaffold::{MssqlConnectionFactory, ScaffoldConfig, Scaffolder};
//! use std::path::Path;
//!
//! let config = ScaffoldConfig::load().unwrap_or_default();
//! let factory = MssqlConnectionFactory::new(config.connection_string.clone()).unwrap();
//! let scaffolder = Scaffolder::new(factory).with_language(config.language);
//! let ok = scaffolder.generate_schema("Sales", Path::new("src/models"), None, config.safe_mode);
//! ```

pub mod config;
pub mod connection;
pub mod emit;
pub mod error;
pub mod executor;
pub mod generator;
pub mod schema;
pub mod store;
pub mod sync;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(feature = "tracing")]
pub mod tracing_helpers;

pub use config::ScaffoldConfig;
pub use connection::{validate_connection_string, ConnectionFactory, MssqlConnectionFactory};
pub use emit::{GeneratedArtifact, Language, TargetLanguage};
pub use error::{ExtractionError, ScaffoldError, StaleArtifactCleanupError, StoreError};
pub use executor::{CatalogExecutor, MssqlExecutor};
pub use generator::{ContextReport, GenerationReport, Scaffolder};
pub use schema::{extract_schema, ColumnDescriptor, TableDescriptor};
pub use store::{ArtifactStore, DirectoryStore, MemoryStore};
pub use sync::{synchronize_artifacts, SyncReport};
