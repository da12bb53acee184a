//! Catalog executor
//!
//! [`CatalogExecutor`] is the seam between extraction and the database
//! driver. [`MssqlExecutor`] implements it over `tiberius`; tests use
//! `test_helpers::MockExecutor`.

use crate::connection::{strip_database_keys, validate_connection_string};
use crate::error::ExtractionError;
use crate::schema::{CatalogRow, ColumnDescriptor, CATALOG_QUERY, DATABASE_STATE_QUERY};
use log::debug;
use std::time::Instant;
use tiberius::{Client, Config, Row};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Read-only access to the catalog of one database.
///
/// Implementations hold a connection whose current database is the one being
/// scaffolded. Dropping the executor releases the connection.
pub trait CatalogExecutor {
    /// `state_desc` of the named database, or `None` if it does not exist.
    fn database_state(&mut self, database_name: &str) -> Result<Option<String>, ExtractionError>;

    /// All rows of [`CATALOG_QUERY`], in query order.
    fn catalog_rows(&mut self) -> Result<Vec<CatalogRow>, ExtractionError>;
}

/// `tiberius` client driven by a private current-thread runtime.
///
/// Every call blocks until the query has been read to completion, so the
/// pipeline above stays synchronous.
pub struct MssqlExecutor {
    runtime: Runtime,
    client: Client<Compat<TcpStream>>,
    database: String,
}

impl MssqlExecutor {
    /// Connect with an ADO-style connection string for scaffolding
    /// `database_name`.
    ///
    /// The login's default database stays current until the first catalog
    /// query, so that a missing or offline target can still be reported as such.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidConnectionString`] if the string is
    /// rejected, or [`ExtractionError::Connect`] for network and login
    /// failures.
    pub fn connect(connection_string: &str, database_name: &str) -> Result<Self, ExtractionError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::acquire_connection_span(database_name).entered();

        validate_connection_string(connection_string)?;

        let config = Config::from_ado_string(&strip_database_keys(connection_string))
            .map_err(|e| ExtractionError::InvalidConnectionString(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ExtractionError::Connect(format!("could not start runtime: {e}")))?;

        let start = Instant::now();
        let client = runtime.block_on(async {
            let tcp = TcpStream::connect(config.get_addr())
                .await
                .map_err(|e| ExtractionError::Connect(e.to_string()))?;
            tcp.set_nodelay(true)
                .map_err(|e| ExtractionError::Connect(e.to_string()))?;

            Client::connect(config, tcp.compat_write())
                .await
                .map_err(|e| ExtractionError::Connect(e.to_string()))
        })?;
        debug!("Connected to {} in {:?}", database_name, start.elapsed());

        Ok(Self {
            runtime,
            client,
            database: database_name.to_string(),
        })
    }
}

impl Drop for MssqlExecutor {
    fn drop(&mut self) {
        debug!("Releasing connection to {}", self.database);
    }
}

impl CatalogExecutor for MssqlExecutor {
    fn database_state(&mut self, database_name: &str) -> Result<Option<String>, ExtractionError> {
        let Self { runtime, client, .. } = self;

        let state = runtime.block_on(async {
            let row = client
                .query(DATABASE_STATE_QUERY, &[&database_name])
                .await?
                .into_row()
                .await?;

            match row {
                Some(row) => row.try_get::<&str, _>(0).map(|s| s.map(str::to_owned)),
                None => Ok(None),
            }
        })?;

        Ok(state)
    }

    fn catalog_rows(&mut self) -> Result<Vec<CatalogRow>, ExtractionError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::catalog_query_span().entered();

        let Self {
            runtime,
            client,
            database,
        } = self;
        let use_database = format!("USE [{}]", database.replace(']', "]]"));
        let start = Instant::now();

        let rows = runtime.block_on(async {
            client.simple_query(use_database).await?.into_results().await?;
            client
                .query(CATALOG_QUERY, &[])
                .await?
                .into_first_result()
                .await
        })?;
        debug!("Catalog query read {} rows in {:?}", rows.len(), start.elapsed());

        rows.iter().map(catalog_row_from).collect()
    }
}

fn catalog_row_from(row: &Row) -> Result<CatalogRow, ExtractionError> {
    let column = ColumnDescriptor {
        name: required_str(row, "ColumnName")?,
        native_type: required_str(row, "DataType")?,
        is_nullable: flag(row, "IsNullable")?,
        max_length: row.try_get::<i16, _>("MaxLength")?.map(i32::from).unwrap_or(0),
        is_primary_key: flag(row, "IsPrimaryKey")?,
        is_identity: flag(row, "IsIdentity")?,
        is_foreign_key: flag(row, "IsForeignKey")?,
        foreign_key_table: optional_str(row, "ForeignKeyTable")?,
        foreign_key_column: optional_str(row, "ForeignKeyColumn")?,
        default_value: optional_str(row, "DefaultValue")?,
    };

    Ok(CatalogRow {
        schema_name: required_str(row, "SchemaName")?,
        table_name: required_str(row, "TableName")?,
        column,
    })
}

fn required_str(row: &Row, column: &str) -> Result<String, ExtractionError> {
    optional_str(row, column)?
        .ok_or_else(|| ExtractionError::MalformedRow(format!("{column} is NULL")))
}

fn optional_str(row: &Row, column: &str) -> Result<Option<String>, ExtractionError> {
    Ok(row.try_get::<&str, _>(column)?.map(str::to_owned))
}

fn flag(row: &Row, column: &str) -> Result<bool, ExtractionError> {
    Ok(row.try_get::<bool, _>(column)?.unwrap_or(false))
}
