//! In-memory schema description
//!
//! Descriptors are produced fresh by [`extract::extract_schema`] on every run
//! and dropped once the artifacts have been written.

pub mod extract;

use serde::Serialize;

pub use extract::{extract_schema, group_catalog_rows, CatalogRow, CATALOG_QUERY, DATABASE_STATE_QUERY};

/// One user table and its columns in catalog ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    pub name: String,
    pub schema: String,
    pub columns: Vec<ColumnDescriptor>,
}

/// One column as reported by `sys.columns` and the key catalog views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Catalog type name, e.g. `nvarchar`
    pub native_type: String,
    pub is_nullable: bool,
    /// Byte length from `sys.columns.max_length`; `-1` for `max`
    pub max_length: i32,
    pub is_primary_key: bool,
    pub is_identity: bool,
    pub is_foreign_key: bool,
    pub foreign_key_table: Option<String>,
    pub foreign_key_column: Option<String>,
    /// Raw default constraint text, e.g. `((0))`
    pub default_value: Option<String>,
}

impl TableDescriptor {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            columns: Vec::new(),
        }
    }

    /// Columns treated as the primary key by emitters.
    ///
    /// A column qualifies when its name is `id` in any casing. The catalog's
    /// own primary-key flag is not consulted.
    pub fn id_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.is_id_column())
    }
}

impl ColumnDescriptor {
    /// Plain column: not a key, not an identity, no default.
    pub fn new(name: impl Into<String>, native_type: impl Into<String>, is_nullable: bool) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            is_nullable,
            max_length: 0,
            is_primary_key: false,
            is_identity: false,
            is_foreign_key: false,
            foreign_key_table: None,
            foreign_key_column: None,
            default_value: None,
        }
    }

    pub fn with_max_length(mut self, max_length: i32) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.is_foreign_key = true;
        self.foreign_key_table = Some(table.into());
        self.foreign_key_column = Some(column.into());
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn is_id_column(&self) -> bool {
        self.name.eq_ignore_ascii_case("id")
    }

    /// Declared SQL type as it would appear in DDL, e.g. `nvarchar(100)`.
    ///
    /// Lengths are only shown for the variable and fixed length string and
    /// binary types; `n`-prefixed types store two bytes per character.
    pub fn declared_type(&self) -> String {
        let native = self.native_type.to_ascii_lowercase();
        let bytes_per_char = match native.as_str() {
            "nchar" | "nvarchar" => 2,
            "char" | "varchar" | "binary" | "varbinary" => 1,
            _ => return self.native_type.clone(),
        };

        match self.max_length {
            -1 => format!("{}(max)", self.native_type),
            n if n > 0 => format!("{}({})", self.native_type, n / bytes_per_char),
            _ => self.native_type.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_halves_unicode_lengths() {
        let col = ColumnDescriptor::new("Name", "nvarchar", true).with_max_length(200);
        assert_eq!(col.declared_type(), "nvarchar(100)");
    }

    #[test]
    fn test_declared_type_max() {
        let col = ColumnDescriptor::new("Body", "varchar", true).with_max_length(-1);
        assert_eq!(col.declared_type(), "varchar(max)");
    }

    #[test]
    fn test_declared_type_fixed_types_ignore_length() {
        let col = ColumnDescriptor::new("Id", "int", false).with_max_length(4);
        assert_eq!(col.declared_type(), "int");
    }

    #[test]
    fn test_id_column_is_case_insensitive() {
        assert!(ColumnDescriptor::new("ID", "int", false).is_id_column());
        assert!(ColumnDescriptor::new("id", "int", false).is_id_column());
        assert!(!ColumnDescriptor::new("UserId", "int", false).is_id_column());
    }

    #[test]
    fn test_id_columns_ignores_catalog_flag() {
        let mut table = TableDescriptor::new("dbo", "Codes");
        table.columns.push(ColumnDescriptor::new("Code", "char", false).primary_key());
        table.columns.push(ColumnDescriptor::new("Id", "int", false));

        let ids: Vec<_> = table.id_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(ids, vec!["Id"]);
    }

    #[test]
    fn test_descriptor_serializes_for_inspection() {
        let mut table = TableDescriptor::new("dbo", "Orders");
        table.columns.push(
            ColumnDescriptor::new("CustomerId", "int", true).references("Customers", "Id"),
        );

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["schema"], "dbo");
        assert_eq!(json["columns"][0]["native_type"], "int");
        assert_eq!(json["columns"][0]["foreign_key_table"], "Customers");
        assert!(json["columns"][0]["default_value"].is_null());
    }
}
