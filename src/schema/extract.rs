//! Catalog metadata extraction
//!
//! One query against the catalog views returns a row per column of every
//! user table, already ordered by table then column ordinal. Rows are folded
//! into [`TableDescriptor`]s in a single pass.

use crate::error::ExtractionError;
use crate::executor::CatalogExecutor;
use crate::schema::{ColumnDescriptor, TableDescriptor};
use log::{debug, info};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Looks up the state of a database; `@P1` is the database name.
pub const DATABASE_STATE_QUERY: &str =
    "SELECT state_desc FROM sys.databases WHERE name = @P1";

/// Column metadata for every user table of the connection's current database.
///
/// `is_ms_shipped = 0` excludes system objects. The `OUTER APPLY`s pick at
/// most one primary-key index entry and one foreign-key column per column so
/// that a column in several indexes or constraints still yields one row.
pub const CATALOG_QUERY: &str = r#"
SELECT
    SCHEMA_NAME(t.schema_id) AS SchemaName,
    t.name AS TableName,
    c.name AS ColumnName,
    TYPE_NAME(c.user_type_id) AS DataType,
    c.max_length AS MaxLength,
    c.is_nullable AS IsNullable,
    CAST(CASE WHEN pk.column_id IS NULL THEN 0 ELSE 1 END AS bit) AS IsPrimaryKey,
    c.is_identity AS IsIdentity,
    CAST(CASE WHEN fk.parent_column_id IS NULL THEN 0 ELSE 1 END AS bit) AS IsForeignKey,
    OBJECT_NAME(fk.referenced_object_id) AS ForeignKeyTable,
    COL_NAME(fk.referenced_object_id, fk.referenced_column_id) AS ForeignKeyColumn,
    OBJECT_DEFINITION(c.default_object_id) AS DefaultValue
FROM sys.tables t
INNER JOIN sys.columns c ON c.object_id = t.object_id
OUTER APPLY (
    SELECT TOP 1 ic.column_id
    FROM sys.indexes i
    INNER JOIN sys.index_columns ic
        ON ic.object_id = i.object_id AND ic.index_id = i.index_id
    WHERE i.object_id = c.object_id
      AND i.is_primary_key = 1
      AND ic.column_id = c.column_id
) pk
OUTER APPLY (
    SELECT TOP 1 fkc.parent_column_id, fkc.referenced_object_id, fkc.referenced_column_id
    FROM sys.foreign_key_columns fkc
    WHERE fkc.parent_object_id = c.object_id
      AND fkc.parent_column_id = c.column_id
    ORDER BY fkc.constraint_object_id
) fk
WHERE t.is_ms_shipped = 0
ORDER BY t.name, SCHEMA_NAME(t.schema_id), c.column_id
"#;

/// One row of [`CATALOG_QUERY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub schema_name: String,
    pub table_name: String,
    pub column: ColumnDescriptor,
}

/// Read the schema of `database_name` through `executor`.
///
/// Fails with [`ExtractionError::DatabaseNotFound`] or
/// [`ExtractionError::DatabaseOffline`] before issuing the catalog query if
/// the database is not usable. There is no retry.
pub fn extract_schema<E: CatalogExecutor + ?Sized>(
    executor: &mut E,
    database_name: &str,
) -> Result<Vec<TableDescriptor>, ExtractionError> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::extract_schema_span(database_name).entered();

    match executor.database_state(database_name)? {
        None => return Err(ExtractionError::DatabaseNotFound(database_name.to_string())),
        Some(state) if !state.eq_ignore_ascii_case("ONLINE") => {
            return Err(ExtractionError::DatabaseOffline {
                database: database_name.to_string(),
                state,
            });
        }
        Some(_) => {}
    }

    let rows = executor.catalog_rows()?;
    debug!("Catalog query for {} returned {} rows", database_name, rows.len());

    let tables = group_catalog_rows(rows);
    info!(
        "Extracted {} table{} from {}",
        tables.len(),
        if tables.len() == 1 { "" } else { "s" },
        database_name
    );
    Ok(tables)
}

/// Fold catalog-ordered rows into tables.
///
/// A new table starts whenever the `(schema, table)` pair differs from the
/// previous row. Input order is preserved; nothing is sorted.
pub fn group_catalog_rows<I>(rows: I) -> Vec<TableDescriptor>
where
    I: IntoIterator<Item = CatalogRow>,
{
    let mut tables = Vec::new();
    let mut current: Option<TableDescriptor> = None;

    for row in rows {
        let same_table = current
            .as_ref()
            .is_some_and(|t| t.name == row.table_name && t.schema == row.schema_name);

        if !same_table {
            if let Some(done) = current.take() {
                tables.push(done);
            }
            current = Some(TableDescriptor::new(row.schema_name, row.table_name));
        }

        if let Some(table) = current.as_mut() {
            table.columns.push(row.column);
        }
    }

    if let Some(done) = current {
        tables.push(done);
    }

    tables
}
