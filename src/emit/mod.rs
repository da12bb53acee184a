//! Source emission
//!
//! A [`TargetLanguage`] turns [`TableDescriptor`]s into [`GeneratedArtifact`]s.
//! Field order always follows column order and nullable wrapping always
//! follows [`type_mapping::TypeMap::map_type`]; everything else (file naming,
//! annotations, the index and context artifacts) is per language.

pub mod csharp;
pub mod rust;
pub mod type_mapping;
pub mod writer;

use crate::schema::TableDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use csharp::CSharp;
pub use rust::Rust;
pub use type_mapping::TypeMap;
pub use writer::SourceWriter;

/// One generated output unit, keyed by file name within its directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub file_name: String,
    pub content: String,
}

impl GeneratedArtifact {
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// A model type found in an existing models directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredModel {
    pub type_name: String,
    pub table_name: Option<String>,
}

/// Inputs for rendering context artifacts.
#[derive(Debug, Clone, Copy)]
pub struct ContextRequest<'a> {
    pub database_name: &'a str,
    pub namespace: &'a str,
    pub models: &'a [DiscoveredModel],
}

/// Templates and naming rules for one output language.
pub trait TargetLanguage {
    fn name(&self) -> &'static str;

    fn type_map(&self) -> &'static TypeMap;

    /// Target type for a column; see [`TypeMap::map_type`].
    fn map_type(&self, native_type: &str, is_nullable: bool) -> String {
        self.type_map().map_type(native_type, is_nullable)
    }

    /// Directory (relative to the project) holding model artifacts.
    fn models_dir(&self) -> &'static str;

    /// Directory (relative to the project) holding context artifacts.
    fn context_dir(&self) -> &'static str;

    /// Namespace used when the caller gives none.
    fn default_namespace(&self, project_name: &str) -> String;

    /// Namespace of the models when the context lives in `namespace`.
    fn models_namespace(&self, namespace: &str) -> String;

    fn artifact_file_name(&self, table: &TableDescriptor) -> String;

    fn index_file_name(&self) -> &'static str;

    /// Whether a file in the models directory is one this language
    /// generates per table (and may therefore be deleted as obsolete).
    fn is_managed_artifact(&self, file_name: &str) -> bool;

    fn render_artifact(&self, table: &TableDescriptor, namespace: &str) -> GeneratedArtifact;

    /// Aggregation marker for the models directory. Carries no per-table entries.
    fn render_index(&self, tables: &[TableDescriptor], namespace: &str) -> GeneratedArtifact;

    /// Model declared in a managed file, if any. `models_namespace` is the
    /// namespace the models were generated into.
    fn discover_model(
        &self,
        file_name: &str,
        content: &str,
        models_namespace: &str,
    ) -> Option<DiscoveredModel>;

    fn render_context(&self, request: &ContextRequest<'_>) -> Vec<GeneratedArtifact>;
}

/// Languages selectable from configuration and the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Rust,
    #[serde(alias = "c#", alias = "cs")]
    CSharp,
}

impl Language {
    pub fn target(self) -> &'static dyn TargetLanguage {
        match self {
            Language::Rust => &Rust,
            Language::CSharp => &CSharp,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target().name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rust" | "rs" => Ok(Language::Rust),
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            other => Err(format!("Unknown language '{other}' (expected rust or csharp)")),
        }
    }
}

/// Name of the collection exposing a model on a context.
///
/// Drops a trailing `Model`, then pluralises naively: `y` becomes `ies`,
/// anything else gains an `s` (`CategoryModel` → `Categories`,
/// `UserModel` → `Users`).
pub fn entity_set_name(model_name: &str) -> String {
    let base = match model_name.strip_suffix("Model") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => model_name,
    };

    match base.strip_suffix('y') {
        Some(stem) => format!("{stem}ies"),
        None => format!("{base}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_set_name() {
        assert_eq!(entity_set_name("UserModel"), "Users");
        assert_eq!(entity_set_name("CategoryModel"), "Categories");
        assert_eq!(entity_set_name("Order"), "Orders");
        assert_eq!(entity_set_name("EmployeesModel"), "Employeess");
        assert_eq!(entity_set_name("Model"), "Models");
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("rust".parse::<Language>().unwrap(), Language::Rust);
        assert_eq!("C#".parse::<Language>().unwrap(), Language::CSharp);
        assert_eq!("csharp".parse::<Language>().unwrap(), Language::CSharp);
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_display_round_trips() {
        for lang in [Language::Rust, Language::CSharp] {
            assert_eq!(lang.to_string().parse::<Language>().unwrap(), lang);
        }
    }
}
