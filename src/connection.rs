//! Connection Module
//!
//! Validates ADO-style SQL Server connection strings and opens executors
//! scoped to one database.
//!
//! The pipeline never reads connection settings from ambient state: a
//! [`ConnectionFactory`] is built from an explicit [`crate::config::ScaffoldConfig`]
//! and handed to the generator.

use crate::error::ExtractionError;
use crate::executor::{CatalogExecutor, MssqlExecutor};

/// ADO-style connection string, e.g.
/// `Server=tcp:localhost,1433;User Id=sa;Password=...;TrustServerCertificate=true`
pub type ConnectionString = String;

/// Source of executors, one per generation run.
///
/// The returned executor owns its connection; it is released when the
/// executor is dropped, whether extraction succeeded or not.
pub trait ConnectionFactory {
    type Executor: CatalogExecutor;

    /// Open a connection whose current database is `database_name`.
    fn open(&self, database_name: &str) -> Result<Self::Executor, ExtractionError>;
}

/// Opens [`MssqlExecutor`]s from a base connection string.
///
/// Any `Database`/`Initial Catalog` key in the base string is ignored: the
/// login's default database is used for the state query and the database
/// being scaffolded for the catalog query.
#[derive(Debug, Clone)]
pub struct MssqlConnectionFactory {
    connection_string: ConnectionString,
}

impl MssqlConnectionFactory {
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidConnectionString`] if the string
    /// fails [`validate_connection_string`].
    pub fn new(connection_string: impl Into<ConnectionString>) -> Result<Self, ExtractionError> {
        let connection_string = connection_string.into();
        validate_connection_string(&connection_string)?;
        Ok(Self { connection_string })
    }
}

impl ConnectionFactory for MssqlConnectionFactory {
    type Executor = MssqlExecutor;

    fn open(&self, database_name: &str) -> Result<MssqlExecutor, ExtractionError> {
        MssqlExecutor::connect(&self.connection_string, database_name)
    }
}

/// Validates a connection string format
///
/// Accepts `key=value` pairs separated by `;` (the ADO.NET format). A server
/// must be named with one of `Server`, `Data Source`, `Address`, `Addr` or
/// `Network Address`.
pub fn validate_connection_string(connection_string: &str) -> Result<(), ExtractionError> {
    if connection_string.trim().is_empty() {
        return Err(ExtractionError::InvalidConnectionString(
            "Connection string cannot be empty".to_string(),
        ));
    }

    let mut has_server = false;
    for pair in connection_string.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((key, _)) = pair.split_once('=') else {
            return Err(ExtractionError::InvalidConnectionString(format!(
                "Expected key=value, found '{pair}'"
            )));
        };

        let key = key.trim().to_ascii_lowercase();
        if matches!(
            key.as_str(),
            "server" | "data source" | "address" | "addr" | "network address"
        ) {
            has_server = true;
        }
    }

    if !has_server {
        return Err(ExtractionError::InvalidConnectionString(
            "Connection string must name a server (Server=... or Data Source=...)".to_string(),
        ));
    }

    Ok(())
}

/// `connection_string` without its `Database`/`Initial Catalog` pairs.
pub fn strip_database_keys(connection_string: &str) -> String {
    connection_string
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(k, _)| k);
            !matches!(
                key.trim().to_ascii_lowercase().as_str(),
                "database" | "initial catalog"
            )
        })
        .collect::<Vec<_>>()
        .join(";")
}
