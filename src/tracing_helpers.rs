//! Span helpers for the `tracing` feature.

use tracing::{info_span, Span};

pub fn acquire_connection_span(database: &str) -> Span {
    info_span!("mssql_scaffold.acquire_connection", database = database)
}

pub fn extract_schema_span(database: &str) -> Span {
    info_span!("mssql_scaffold.extract_schema", database = database)
}

pub fn catalog_query_span() -> Span {
    info_span!("mssql_scaffold.catalog_query")
}

pub fn write_artifact_span(file_name: &str) -> Span {
    info_span!("mssql_scaffold.write_artifact", file_name = file_name)
}

pub fn synchronize_span(safe_mode: bool) -> Span {
    info_span!("mssql_scaffold.synchronize", safe_mode = safe_mode)
}
