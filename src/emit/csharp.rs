//! C# / Entity Framework Core templates
//!
//! Models are data-annotated POCOs in `Models/<Table>Model.cs`; the context
//! is a `DbContext` plus a service-registration extension in `Data/`.

use crate::emit::type_mapping::{TypeMap, CSHARP_TYPES};
use crate::emit::{
    entity_set_name, ContextRequest, DiscoveredModel, GeneratedArtifact, SourceWriter,
    TargetLanguage,
};
use crate::schema::TableDescriptor;
use once_cell::sync::Lazy;
use regex::Regex;

const INDENT: &str = "    ";
const INDEX_FILE: &str = "GlobalUsings.cs";
const MODEL_SUFFIX: &str = "Model.cs";

/// Reserved words; contextual keywords are valid identifiers and are left alone.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

static TABLE_ATTR_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"\[Table\("((?:[^"\\]|\\.)*)"\)\]"#).ok());
static NON_ENTITY_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\b(?:abstract\s+(?:partial\s+)?class|interface)\s+[A-Za-z_]\w*").ok()
});

pub struct CSharp;

impl CSharp {
    fn class_name(table: &TableDescriptor) -> String {
        format!("{}Model", sanitize(&table.name))
    }
}

impl TargetLanguage for CSharp {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn type_map(&self) -> &'static TypeMap {
        &CSHARP_TYPES
    }

    fn models_dir(&self) -> &'static str {
        "Models"
    }

    fn context_dir(&self) -> &'static str {
        "Data"
    }

    fn default_namespace(&self, project_name: &str) -> String {
        format!("{}.Models", csharp_identifier(project_name))
    }

    fn models_namespace(&self, namespace: &str) -> String {
        format!("{namespace}.Models")
    }

    fn artifact_file_name(&self, table: &TableDescriptor) -> String {
        format!("{}.cs", Self::class_name(table))
    }

    fn index_file_name(&self) -> &'static str {
        INDEX_FILE
    }

    fn is_managed_artifact(&self, file_name: &str) -> bool {
        file_name.ends_with(MODEL_SUFFIX) && file_name != INDEX_FILE
    }

    fn render_artifact(&self, table: &TableDescriptor, namespace: &str) -> GeneratedArtifact {
        let mut w = SourceWriter::new(INDENT);

        w.line("using System;")
            .line("using System.ComponentModel.DataAnnotations;")
            .line("using System.ComponentModel.DataAnnotations.Schema;")
            .blank();

        w.line(format!("namespace {namespace}")).open("{");
        w.line(format!("[Table(\"{}\")]", escape(&table.name)))
            .line(format!("public class {}", Self::class_name(table)))
            .open("{");

        for column in &table.columns {
            if column.is_id_column() {
                w.line("[Key]")
                    .line("[DatabaseGenerated(DatabaseGeneratedOption.Identity)]");
            }
            w.line(format!("[Column(\"{}\")]", escape(&column.name))).line(format!(
                "public {} {} {{ get; set; }}",
                self.map_type(&column.native_type, column.is_nullable),
                csharp_identifier(&column.name)
            ));
            w.blank();
        }

        w.close("}").close("}");

        GeneratedArtifact::new(self.artifact_file_name(table), w.finish())
    }

    fn render_index(&self, _tables: &[TableDescriptor], namespace: &str) -> GeneratedArtifact {
        let mut w = SourceWriter::new(INDENT);

        w.line("global using System;")
            .line(format!("global using {namespace};"))
            .blank();
        w.line(format!("namespace {namespace}"))
            .open("{")
            .line("// Index of generated models")
            .close("}");

        GeneratedArtifact::new(INDEX_FILE, w.finish())
    }

    fn discover_model(
        &self,
        file_name: &str,
        content: &str,
        models_namespace: &str,
    ) -> Option<DiscoveredModel> {
        let class_name = file_name.strip_suffix(".cs")?;

        let pattern = format!(
            r"namespace\s+{}\s*\{{[^}}]*class\s+({})\s*(?::\s*\w+)?\s*\{{",
            regex::escape(models_namespace),
            regex::escape(class_name)
        );
        let re = Regex::new(&pattern).ok()?;
        let caps = re.captures(content)?;

        if NON_ENTITY_RE.as_ref()?.is_match(content) {
            return None;
        }

        Some(DiscoveredModel {
            type_name: caps[1].to_string(),
            table_name: TABLE_ATTR_RE
                .as_ref()?
                .captures(content)
                .map(|c| unescape(&c[1])),
        })
    }

    fn render_context(&self, request: &ContextRequest<'_>) -> Vec<GeneratedArtifact> {
        let context_name = format!("{}DbContext", sanitize(request.database_name));
        let data_namespace = format!("{}.Data", request.namespace);

        let mut w = SourceWriter::new(INDENT);
        w.line("using Microsoft.EntityFrameworkCore;")
            .line(format!("using {};", self.models_namespace(request.namespace)))
            .blank();
        w.line(format!("namespace {data_namespace}")).open("{");
        w.line(format!("public class {context_name} : DbContext"))
            .open("{");
        w.line(format!(
            "public {context_name}(DbContextOptions<{context_name}> options)"
        ))
        .indent()
        .line(": base(options)")
        .dedent()
        .line("{")
        .line("}")
        .blank();

        for model in request.models {
            w.line(format!(
                "public DbSet<{}> {} {{ get; set; }}",
                model.type_name,
                entity_set_name(&model.type_name)
            ));
        }

        w.close("}").close("}");
        let context = GeneratedArtifact::new(format!("{context_name}.cs"), w.finish());

        let mut w = SourceWriter::new(INDENT);
        w.line("using Microsoft.EntityFrameworkCore;")
            .line("using Microsoft.Extensions.DependencyInjection;")
            .line(format!("using {data_namespace};"))
            .blank();
        w.line(format!("namespace {data_namespace}")).open("{");
        w.line("public static class DataServiceExtensions").open("{");
        w.line(format!(
            "public static IServiceCollection Add{}Context(",
            sanitize(request.database_name)
        ))
        .indent()
        .line("this IServiceCollection services,")
        .line("string connectionString)")
        .dedent()
        .open("{")
        .line(format!("services.AddDbContext<{context_name}>(options =>"))
        .indent()
        .line("options.UseSqlServer(connectionString));")
        .dedent()
        .blank()
        .line("return services;")
        .close("}");
        w.close("}").close("}");
        let extensions = GeneratedArtifact::new("DataServiceExtensions.cs", w.finish());

        vec![context, extensions]
    }
}

/// Replace characters C# does not allow in identifiers with `_`.
///
/// Suitable as a prefix of a longer name; use [`csharp_identifier`] for a
/// name that stands alone.
fn sanitize(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// [`sanitize`], with the `@` verbatim prefix on reserved words.
fn csharp_identifier(name: &str) -> String {
    let mut ident = sanitize(name);
    if KEYWORDS.contains(&ident.as_str()) {
        ident.insert(0, '@');
    }
    ident
}

/// Escape for a regular C# string literal.
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
