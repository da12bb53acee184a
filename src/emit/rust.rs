//! Rust templates
//!
//! Each table becomes a `#[derive(LifeModel)]` entity in
//! `src/models/<table>_model.rs`, using the `table_name`, `primary_key`,
//! `auto_increment` and `column_name` attributes understood by the
//! lifeguard derive. Field docs carry the declared SQL type, the foreign
//! key target and the default expression.

use crate::emit::type_mapping::{TypeMap, RUST_TYPES};
use crate::emit::{
    entity_set_name, ContextRequest, DiscoveredModel, GeneratedArtifact, SourceWriter,
    TargetLanguage,
};
use crate::schema::{ColumnDescriptor, TableDescriptor};
use heck::{ToSnakeCase, ToUpperCamelCase};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

const INDENT: &str = "    ";
const INDEX_FILE: &str = "mod.rs";
const MODEL_SUFFIX: &str = "_model.rs";
const DERIVE_MARKER: &str = "#[derive(LifeModel)]";

/// Names in the std prelude that a generated struct must not shadow.
const PRELUDE: &[&str] = &[
    "AsMut", "AsRef", "Box", "Clone", "Copy", "Default", "DoubleEndedIterator", "Drop", "Eq",
    "ExactSizeIterator", "Extend", "Err", "Fn", "FnMut", "FnOnce", "From", "FromIterator",
    "Into", "IntoIterator", "Iterator", "None", "Ok", "Option", "Ord", "PartialEq",
    "PartialOrd", "Result", "Send", "Sized", "Some", "String", "Sync", "ToOwned", "ToString",
    "TryFrom", "TryInto", "Unpin", "Vec",
];

static STRUCT_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"#\[derive\(LifeModel[^\]]*\)\]\s*(?:#\[[^\]]*\]\s*)*pub struct\s+(\w+)").ok()
});
static TABLE_NAME_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"#\[table_name\s*=\s*"([^"]+)"\]"#).ok());

pub struct Rust;

impl TargetLanguage for Rust {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn type_map(&self) -> &'static TypeMap {
        &RUST_TYPES
    }

    fn models_dir(&self) -> &'static str {
        "src/models"
    }

    fn context_dir(&self) -> &'static str {
        "src/data"
    }

    fn default_namespace(&self, project_name: &str) -> String {
        format!("{}::models", module_name(project_name))
    }

    fn models_namespace(&self, namespace: &str) -> String {
        format!("{namespace}::models")
    }

    fn artifact_file_name(&self, table: &TableDescriptor) -> String {
        format!("{}{MODEL_SUFFIX}", module_name(&table.name))
    }

    fn index_file_name(&self) -> &'static str {
        INDEX_FILE
    }

    fn is_managed_artifact(&self, file_name: &str) -> bool {
        file_name.ends_with(MODEL_SUFFIX) && file_name != INDEX_FILE
    }

    fn render_artifact(&self, table: &TableDescriptor, namespace: &str) -> GeneratedArtifact {
        let mut w = SourceWriter::new(INDENT);

        w.line(format!("//! `{}.{}` model.", table.schema, table.name))
            .line("//!")
            .line(format!(
                "//! Generated by mssql-scaffold for `{namespace}`. Do not edit by hand."
            ))
            .blank()
            .line("use lifeguard_derive::LifeModel;")
            .blank();

        w.line(DERIVE_MARKER)
            .line(format!("#[table_name = \"{}\"]", escape(&table.name)))
            .open(format!("pub struct {} {{", type_name(&table.name)));

        let mut used = BTreeSet::new();
        for column in &table.columns {
            let field = unique_field_name(&column.name, &mut used);
            self.render_field(&mut w, column, &field);
        }

        w.close("}");

        GeneratedArtifact::new(self.artifact_file_name(table), w.finish())
    }

    fn render_index(&self, _tables: &[TableDescriptor], namespace: &str) -> GeneratedArtifact {
        let mut w = SourceWriter::new(INDENT);
        w.line(format!("//! Index of generated models for `{namespace}`."))
            .line("//!")
            .line("//! Generated by mssql-scaffold. Do not edit by hand.");
        GeneratedArtifact::new(INDEX_FILE, w.finish())
    }

    fn discover_model(
        &self,
        _file_name: &str,
        content: &str,
        _models_namespace: &str,
    ) -> Option<DiscoveredModel> {
        if !content.contains("#[derive(LifeModel") {
            return None;
        }

        let struct_re = STRUCT_RE.as_ref()?;
        let table_re = TABLE_NAME_RE.as_ref()?;
        let caps = struct_re.captures(content)?;
        Some(DiscoveredModel {
            type_name: caps[1].to_string(),
            table_name: table_re.captures(content).map(|c| c[1].to_string()),
        })
    }

    fn render_context(&self, request: &ContextRequest<'_>) -> Vec<GeneratedArtifact> {
        let context_name = format!("{}Context", type_name(request.database_name));

        let mut w = SourceWriter::new(INDENT);
        w.line(format!("//! `{}` database context.", request.database_name))
            .line("//!")
            .line(format!(
                "//! Generated by mssql-scaffold for `{}`. Do not edit by hand.",
                request.namespace
            ))
            .blank();

        w.line("/// Entity sets of the models directory.")
            .line("#[derive(Debug, Default, Clone, Copy)]")
            .line(format!("pub struct {context_name};"))
            .blank();

        w.open(format!("impl {context_name} {{"))
            .line(format!(
                "pub const DATABASE_NAME: &'static str = \"{}\";",
                escape(request.database_name)
            ))
            .blank()
            .line("/// `(set name, model type, table name)` per model.")
            .open("pub const ENTITY_SETS: &'static [(&'static str, &'static str, &'static str)] = &[");

        for model in request.models {
            let table = model.table_name.as_deref().unwrap_or(&model.type_name);
            w.line(format!(
                "(\"{}\", \"{}\", \"{}\"),",
                entity_set_name(&model.type_name).to_snake_case(),
                model.type_name,
                escape(table)
            ));
        }

        w.close("];").close("}");

        let file_name = format!("{}_context.rs", module_name(request.database_name));
        vec![GeneratedArtifact::new(file_name, w.finish())]
    }
}

impl Rust {
    fn render_field(&self, w: &mut SourceWriter, column: &ColumnDescriptor, field: &str) {
        let mut doc = format!("/// `{}`", column.declared_type());
        if column.is_identity {
            doc.push_str(", identity");
        }
        if let (Some(table), Some(target)) = (&column.foreign_key_table, &column.foreign_key_column) {
            doc.push_str(&format!(", references `{table}.{target}`"));
        }
        if let Some(default) = &column.default_value {
            doc.push_str(&format!(", default `{}`", default.trim()));
        }
        w.line(doc);

        if column.is_id_column() {
            w.line("#[primary_key]").line("#[auto_increment]");
        }

        if field.trim_start_matches("r#") != column.name {
            w.line(format!("#[column_name = \"{}\"]", escape(&column.name)));
        }

        w.line(format!(
            "pub {}: {},",
            field,
            self.map_type(&column.native_type, column.is_nullable)
        ));
    }
}

/// Snake-case module/file stem for a table or project name.
fn module_name(name: &str) -> String {
    let snake = name.to_snake_case();
    if snake.is_empty() {
        "unnamed".to_string()
    } else if snake.starts_with(|c: char| c.is_ascii_digit()) {
        format!("t_{snake}")
    } else {
        snake
    }
}

/// UpperCamelCase type name, suffixed with `_` if it would be a keyword or
/// shadow a prelude name.
fn type_name(name: &str) -> String {
    let mut camel = name.to_upper_camel_case();
    if camel.is_empty() {
        camel = "Unnamed".to_string();
    } else if camel.starts_with(|c: char| c.is_ascii_digit()) {
        camel.insert(0, 'T');
    }

    if syn::parse_str::<syn::Ident>(&camel).is_ok() && !PRELUDE.contains(&camel.as_str()) {
        camel
    } else {
        format!("{camel}_")
    }
}

/// [`field_name`], numbered `_2`, `_3`, ... when an earlier column of the
/// same table already took the name.
fn unique_field_name(column: &str, used: &mut BTreeSet<String>) -> String {
    let base = field_name(column);
    if used.insert(base.clone()) {
        return base;
    }

    let stem = base.trim_start_matches("r#");
    let mut n = 2;
    loop {
        let candidate = format!("{stem}_{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// snake_case field name; keywords become raw identifiers where Rust allows it.
fn field_name(column: &str) -> String {
    let mut snake = column.to_snake_case();
    if snake.is_empty() {
        snake = "column".to_string();
    } else if snake.starts_with(|c: char| c.is_ascii_digit()) {
        snake.insert(0, '_');
    }

    if syn::parse_str::<syn::Ident>(&snake).is_ok() {
        snake
    } else if matches!(snake.as_str(), "self" | "super" | "crate" | "_") {
        format!("{snake}_")
    } else {
        format!("r#{snake}")
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employees() -> TableDescriptor {
        let mut table = TableDescriptor::new("dbo", "Employees");
        table.columns = vec![
            ColumnDescriptor::new("Id", "int", false).identity().primary_key(),
            ColumnDescriptor::new("Name", "nvarchar", true).with_max_length(200),
            ColumnDescriptor::new("ManagerId", "int", true).references("Employees", "Id"),
        ];
        table
    }

    #[test]
    fn test_render_artifact_matches_template() {
        let artifact = Rust.render_artifact(&employees(), "hr::models");
        assert_eq!(artifact.file_name, "employees_model.rs");

        let expected = "\
//! `dbo.Employees` model.
//!
//! Generated by mssql-scaffold for `hr::models`. Do not edit by hand.

use lifeguard_derive::LifeModel;

#[derive(LifeModel)]
#[table_name = \"Employees\"]
pub struct Employees {
    /// `int`, identity
    #[primary_key]
    #[auto_increment]
    #[column_name = \"Id\"]
    pub id: i32,
    /// `nvarchar(100)`
    #[column_name = \"Name\"]
    pub name: String,
    /// `int`, references `Employees.Id`
    #[column_name = \"ManagerId\"]
    pub manager_id: Option<i32>,
}
";
        assert_eq!(artifact.content, expected);
    }

    #[test]
    fn test_snake_case_columns_skip_column_name() {
        let mut table = TableDescriptor::new("dbo", "audit_log");
        table.columns = vec![ColumnDescriptor::new("created_at", "datetime2", false)
            .with_default("(sysutcdatetime())")];

        let artifact = Rust.render_artifact(&table, "app::models");
        assert!(artifact.content.contains("pub struct AuditLog {"));
        assert!(artifact.content.contains("/// `datetime2`, default `(sysutcdatetime())`"));
        assert!(artifact.content.contains("pub created_at: chrono::NaiveDateTime,"));
        assert!(!artifact.content.contains("#[column_name"));
    }

    #[test]
    fn test_keyword_columns_use_raw_identifiers() {
        assert_eq!(field_name("Type"), "r#type");
        assert_eq!(field_name("Self"), "self_");
        assert_eq!(field_name("2ndLine"), "_2nd_line");
        assert_eq!(field_name("Unit Price"), "unit_price");
    }

    #[test]
    fn test_raw_identifier_keeps_column_name_check() {
        let mut table = TableDescriptor::new("dbo", "Items");
        table.columns = vec![ColumnDescriptor::new("type", "varchar", false)];

        let artifact = Rust.render_artifact(&table, "app::models");
        assert!(artifact.content.contains("pub r#type: String,"));
        assert!(!artifact.content.contains("#[column_name"));
    }

    #[test]
    fn test_type_and_module_names() {
        assert_eq!(type_name("order_items"), "OrderItems");
        assert_eq!(type_name("self"), "Self_");
        assert_eq!(type_name("string"), "String_");
        assert_eq!(type_name("Option"), "Option_");
        assert_eq!(module_name("OrderItems"), "order_items");
        assert_eq!(module_name("2020sales"), "t_2020sales");
    }

    #[test]
    fn test_colliding_columns_and_prelude_table_name() {
        let mut table = TableDescriptor::new("dbo", "String");
        table.columns = vec![
            ColumnDescriptor::new("OrderID", "int", false),
            ColumnDescriptor::new("Order_ID", "int", false),
            ColumnDescriptor::new("order_id", "int", true),
            ColumnDescriptor::new("Label", "nvarchar", true),
        ];

        let artifact = Rust.render_artifact(&table, "app::models");
        assert_eq!(artifact.file_name, "string_model.rs");
        let content = &artifact.content;
        assert!(content.contains("pub struct String_ {"));
        assert!(content.contains("#[table_name = \"String\"]"));

        let fields: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|l| l.starts_with("pub ") && l.ends_with(','))
            .collect();
        assert_eq!(
            fields,
            vec![
                "pub order_id: i32,",
                "pub order_id_2: i32,",
                "pub order_id_3: Option<i32>,",
                "pub label: String,",
            ]
        );
        assert!(content.contains("#[column_name = \"Order_ID\"]\n    pub order_id_2: i32,"));
        assert!(content.contains("#[column_name = \"order_id\"]\n    pub order_id_3: Option<i32>,"));
    }

    #[test]
    fn test_unique_field_name_numbers_raw_identifiers() {
        let mut used = BTreeSet::new();
        assert_eq!(unique_field_name("type", &mut used), "r#type");
        assert_eq!(unique_field_name("Type", &mut used), "type_2");
        assert_eq!(unique_field_name("type_2", &mut used), "type_2_2");
    }

    #[test]
    fn test_managed_artifacts() {
        assert!(Rust.is_managed_artifact("orders_model.rs"));
        assert!(!Rust.is_managed_artifact("mod.rs"));
        assert!(!Rust.is_managed_artifact("helpers.rs"));
    }

    #[test]
    fn test_index_has_no_table_entries() {
        let artifact = Rust.render_index(&[employees()], "hr::models");
        assert_eq!(artifact.file_name, "mod.rs");
        assert!(!artifact.content.contains("employees"));
        assert!(!artifact.content.contains("pub mod"));
    }

    #[test]
    fn test_discover_generated_model() {
        let artifact = Rust.render_artifact(&employees(), "hr::models");
        let model = Rust
            .discover_model(&artifact.file_name, &artifact.content, "hr::models")
            .expect("model should be discovered");
        assert_eq!(model.type_name, "Employees");
        assert_eq!(model.table_name.as_deref(), Some("Employees"));
    }

    #[test]
    fn test_discover_ignores_plain_structs() {
        let content = "pub struct Helper {\n    pub x: i32,\n}\n";
        assert!(Rust.discover_model("helper_model.rs", content, "app::models").is_none());
    }

    #[test]
    fn test_render_context() {
        let models = vec![DiscoveredModel {
            type_name: "Category".to_string(),
            table_name: Some("Category".to_string()),
        }];
        let artifacts = Rust.render_context(&ContextRequest {
            database_name: "ShopDb",
            namespace: "shop",
            models: &models,
        });

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].file_name, "shop_db_context.rs");
        let content = &artifacts[0].content;
        assert!(content.contains("pub struct ShopDbContext;"));
        assert!(content.contains("pub const DATABASE_NAME: &'static str = \"ShopDb\";"));
        assert!(content.contains("(\"categories\", \"Category\", \"Category\"),"));
    }
}
