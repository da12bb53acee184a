//! Type mapping from SQL Server native type names to target-language types.
//!
//! Lookups are case-insensitive. Anything not in a table maps to that
//! language's text type. Nullable columns are wrapped in the language's
//! optional form unless the mapped type is the text type, which is never
//! wrapped.

/// Fixed lookup table for one target language.
#[derive(Debug)]
pub struct TypeMap {
    entries: &'static [(&'static str, &'static str)],
    text_type: &'static str,
    wrap_nullable: fn(&str) -> String,
}

impl TypeMap {
    /// Non-nullable target type for `native_type`.
    pub fn base_type(&self, native_type: &str) -> &'static str {
        let native_lower = native_type.trim().to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(native, _)| *native == native_lower)
            .map(|(_, target)| *target)
            .unwrap_or(self.text_type)
    }

    /// Target type for a column, applying the nullable form where it applies.
    pub fn map_type(&self, native_type: &str, is_nullable: bool) -> String {
        let base = self.base_type(native_type);
        if is_nullable && !self.is_text(base) {
            (self.wrap_nullable)(base)
        } else {
            base.to_string()
        }
    }

    pub fn is_text(&self, target_type: &str) -> bool {
        target_type == self.text_type
    }
}

fn rust_option(base: &str) -> String {
    format!("Option<{base}>")
}

fn csharp_nullable(base: &str) -> String {
    format!("{base}?")
}

/// SQL Server → Rust, using the `chrono`, `uuid` and `rust_decimal` types
/// that ORM models conventionally carry.
pub static RUST_TYPES: TypeMap = TypeMap {
    entries: &[
        ("int", "i32"),
        ("bigint", "i64"),
        ("smallint", "i16"),
        ("tinyint", "u8"),
        ("bit", "bool"),
        ("decimal", "rust_decimal::Decimal"),
        ("numeric", "rust_decimal::Decimal"),
        ("money", "rust_decimal::Decimal"),
        ("smallmoney", "rust_decimal::Decimal"),
        ("float", "f64"),
        ("real", "f32"),
        ("datetime", "chrono::NaiveDateTime"),
        ("datetime2", "chrono::NaiveDateTime"),
        ("smalldatetime", "chrono::NaiveDateTime"),
        ("date", "chrono::NaiveDate"),
        ("time", "chrono::NaiveTime"),
        ("datetimeoffset", "chrono::DateTime<chrono::FixedOffset>"),
        ("uniqueidentifier", "uuid::Uuid"),
        ("binary", "Vec<u8>"),
        ("varbinary", "Vec<u8>"),
        ("image", "Vec<u8>"),
        ("timestamp", "Vec<u8>"),
        ("char", "String"),
        ("varchar", "String"),
        ("nchar", "String"),
        ("nvarchar", "String"),
        ("text", "String"),
        ("ntext", "String"),
        ("xml", "String"),
    ],
    text_type: "String",
    wrap_nullable: rust_option,
};

/// SQL Server → C# (EF Core conventions).
pub static CSHARP_TYPES: TypeMap = TypeMap {
    entries: &[
        ("int", "int"),
        ("bigint", "long"),
        ("smallint", "short"),
        ("tinyint", "byte"),
        ("bit", "bool"),
        ("decimal", "decimal"),
        ("numeric", "decimal"),
        ("money", "decimal"),
        ("smallmoney", "decimal"),
        ("float", "double"),
        ("real", "float"),
        ("datetime", "DateTime"),
        ("datetime2", "DateTime"),
        ("smalldatetime", "DateTime"),
        ("date", "DateTime"),
        ("time", "TimeSpan"),
        ("datetimeoffset", "DateTimeOffset"),
        ("uniqueidentifier", "Guid"),
        ("binary", "byte[]"),
        ("varbinary", "byte[]"),
        ("image", "byte[]"),
        ("timestamp", "byte[]"),
        ("char", "string"),
        ("varchar", "string"),
        ("nchar", "string"),
        ("nvarchar", "string"),
        ("text", "string"),
        ("ntext", "string"),
        ("xml", "string"),
    ],
    text_type: "string",
    wrap_nullable: csharp_nullable,
};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn known_natives() -> Vec<String> {
        RUST_TYPES.entries.iter().map(|(n, _)| n.to_string()).collect()
    }

    #[test]
    fn test_rust_integer_types() {
        assert_eq!(RUST_TYPES.map_type("int", false), "i32");
        assert_eq!(RUST_TYPES.map_type("bigint", false), "i64");
        assert_eq!(RUST_TYPES.map_type("smallint", false), "i16");
        assert_eq!(RUST_TYPES.map_type("tinyint", false), "u8");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(RUST_TYPES.map_type("NVARCHAR", false), "String");
        assert_eq!(CSHARP_TYPES.map_type("UniqueIdentifier", false), "Guid");
    }

    #[test]
    fn test_nullable_wraps_non_text() {
        assert_eq!(RUST_TYPES.map_type("int", true), "Option<i32>");
        assert_eq!(RUST_TYPES.map_type("varbinary", true), "Option<Vec<u8>>");
        assert_eq!(CSHARP_TYPES.map_type("datetime2", true), "DateTime?");
        assert_eq!(CSHARP_TYPES.map_type("image", true), "byte[]?");
    }

    #[test]
    fn test_nullable_text_is_never_wrapped() {
        assert_eq!(RUST_TYPES.map_type("nvarchar", true), "String");
        assert_eq!(CSHARP_TYPES.map_type("xml", true), "string");
    }

    #[test]
    fn test_unknown_type_maps_to_text() {
        assert_eq!(RUST_TYPES.map_type("geography", false), "String");
        assert_eq!(RUST_TYPES.map_type("hierarchyid", true), "String");
        assert_eq!(CSHARP_TYPES.map_type("sql_variant", true), "string");
    }

    proptest! {
        #[test]
        fn map_type_is_deterministic(native in "[a-zA-Z0-9_]{0,16}", nullable in any::<bool>()) {
            prop_assert_eq!(
                RUST_TYPES.map_type(&native, nullable),
                RUST_TYPES.map_type(&native, nullable)
            );
            prop_assert_eq!(
                CSHARP_TYPES.map_type(&native, nullable),
                CSHARP_TYPES.map_type(&native, nullable)
            );
        }

        #[test]
        fn nullable_is_wrapped_non_nullable_unless_text(
            native in prop_oneof![proptest::sample::select(known_natives()), "[a-z0-9]{1,16}"]
        ) {
            for map in [&RUST_TYPES, &CSHARP_TYPES] {
                let base = map.map_type(&native, false);
                let nullable = map.map_type(&native, true);
                if map.is_text(&base) {
                    prop_assert_eq!(nullable, base);
                } else {
                    prop_assert_eq!(nullable, (map.wrap_nullable)(&base));
                }
            }
        }
    }

    #[test]
    fn test_known_types_cover_both_languages() {
        for (native, _) in RUST_TYPES.entries {
            assert!(
                CSHARP_TYPES.entries.iter().any(|(n, _)| n == native),
                "{} missing from C# table",
                native
            );
        }
    }
}
