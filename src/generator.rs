//! Generation runs
//!
//! A [`Scaffolder`] pairs a [`ConnectionFactory`] with a [`Language`] and
//! performs full runs: extract the schema, write one artifact per table,
//! synchronize obsolete artifacts, then write the index. The connection is
//! released before the first artifact is written.
//!
//! `generate_*` methods report success as a `bool` and log the cause of any
//! failure; `try_generate_*` return the error and a report.

use crate::connection::ConnectionFactory;
use crate::emit::{ContextRequest, DiscoveredModel, Language, TargetLanguage};
use crate::error::{ExtractionError, Result, ScaffoldError};
use crate::schema::{extract_schema, TableDescriptor};
use crate::store::{ArtifactStore, DirectoryStore};
use crate::sync::{synchronize_artifacts, SyncReport};
use log::{error, info, warn};
use std::collections::BTreeSet;
use std::path::Path;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// What a model run wrote and removed.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub tables: usize,
    /// Model artifact names in write order
    pub written: Vec<String>,
    pub index: String,
    pub sync: SyncReport,
}

/// What a context run found and wrote.
#[derive(Debug, Default)]
pub struct ContextReport {
    pub models: GenerationReport,
    pub discovered: Vec<DiscoveredModel>,
    pub written: Vec<String>,
}

pub struct Scaffolder<F> {
    factory: F,
    language: Language,
}

impl<F: ConnectionFactory> Scaffolder<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            language: Language::default(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    fn target(&self) -> &'static dyn TargetLanguage {
        self.language.target()
    }

    /// Read the schema of `database_name`, holding the connection only for
    /// the duration of the call.
    pub fn inspect(&self, database_name: &str) -> std::result::Result<Vec<TableDescriptor>, ExtractionError> {
        let mut executor = self.factory.open(database_name)?;
        extract_schema(&mut executor, database_name)
    }

    /// Generate model artifacts for `database_name` into `destination`.
    ///
    /// Returns `false` (after logging the cause) if the run failed.
    pub fn generate_schema(
        &self,
        database_name: &str,
        destination: &Path,
        namespace_hint: Option<&str>,
        safe_mode: bool,
    ) -> bool {
        match self.try_generate_schema(database_name, destination, namespace_hint, safe_mode) {
            Ok(report) => {
                log_summary(database_name, &report);
                true
            }
            Err(e) => {
                error!("Schema generation for {} failed: {}", database_name, e);
                false
            }
        }
    }

    pub fn try_generate_schema(
        &self,
        database_name: &str,
        destination: &Path,
        namespace_hint: Option<&str>,
        safe_mode: bool,
    ) -> Result<GenerationReport> {
        let namespace = self.models_namespace_for(database_name, namespace_hint);
        let tables = self.extract(database_name)?;
        let mut store = DirectoryStore::open(destination).map_err(ScaffoldError::ArtifactWrite)?;
        self.write_models(&mut store, &tables, &namespace, safe_mode)
    }

    /// [`Self::try_generate_schema`] against any store.
    pub fn generate_into<S: ArtifactStore + ?Sized>(
        &self,
        store: &mut S,
        database_name: &str,
        namespace_hint: Option<&str>,
        safe_mode: bool,
    ) -> Result<GenerationReport> {
        let namespace = self.models_namespace_for(database_name, namespace_hint);
        let tables = self.extract(database_name)?;
        self.write_models(store, &tables, &namespace, safe_mode)
    }

    /// Generate models into the project's models directory, then a context
    /// enumerating every model found there into its data directory.
    pub fn generate_context(
        &self,
        database_name: &str,
        project: &Path,
        namespace: Option<&str>,
        safe_mode: bool,
    ) -> bool {
        match self.try_generate_context(database_name, project, namespace, safe_mode) {
            Ok(report) => {
                log_summary(database_name, &report.models);
                info!(
                    "Generated context for {} with {} model(s)",
                    database_name,
                    report.discovered.len()
                );
                true
            }
            Err(e) => {
                error!("Context generation for {} failed: {}", database_name, e);
                false
            }
        }
    }

    pub fn try_generate_context(
        &self,
        database_name: &str,
        project: &Path,
        namespace: Option<&str>,
        safe_mode: bool,
    ) -> Result<ContextReport> {
        let target = self.target();
        let mut models = DirectoryStore::open(project.join(target.models_dir()))
            .map_err(ScaffoldError::ArtifactWrite)?;
        let mut context = DirectoryStore::open(project.join(target.context_dir()))
            .map_err(ScaffoldError::ArtifactWrite)?;

        let fallback = project
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(database_name);
        let root_namespace = namespace.filter(|ns| !ns.trim().is_empty()).unwrap_or(fallback);

        self.generate_context_into(&mut models, &mut context, database_name, root_namespace, safe_mode)
    }

    /// [`Self::try_generate_context`] against any pair of stores.
    pub fn generate_context_into<M, C>(
        &self,
        models: &mut M,
        context: &mut C,
        database_name: &str,
        root_namespace: &str,
        safe_mode: bool,
    ) -> Result<ContextReport>
    where
        M: ArtifactStore + ?Sized,
        C: ArtifactStore + ?Sized,
    {
        let target = self.target();
        let models_namespace = target.models_namespace(root_namespace);

        let model_report =
            self.generate_into(models, database_name, Some(&models_namespace), safe_mode)?;

        let discovered = discover_models(&*models, target, &models_namespace)?;
        let artifacts = target.render_context(&ContextRequest {
            database_name,
            namespace: root_namespace,
            models: &discovered,
        });

        let mut written = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            write_artifact(context, &artifact.file_name, &artifact.content)?;
            written.push(artifact.file_name);
        }

        Ok(ContextReport {
            models: model_report,
            discovered,
            written,
        })
    }

    fn models_namespace_for(&self, database_name: &str, hint: Option<&str>) -> String {
        match hint.map(str::trim).filter(|ns| !ns.is_empty()) {
            Some(ns) => ns.to_string(),
            None => self.target().default_namespace(database_name),
        }
    }

    fn extract(&self, database_name: &str) -> Result<Vec<TableDescriptor>> {
        if database_name.trim().is_empty() {
            return Err(ScaffoldError::InvalidRequest(
                "database name cannot be empty".to_string(),
            ));
        }
        Ok(self.inspect(database_name)?)
    }

    fn write_models<S: ArtifactStore + ?Sized>(
        &self,
        store: &mut S,
        tables: &[TableDescriptor],
        namespace: &str,
        safe_mode: bool,
    ) -> Result<GenerationReport> {
        let target = self.target();
        let mut report = GenerationReport {
            tables: tables.len(),
            ..GenerationReport::default()
        };

        let mut seen = BTreeSet::new();
        for table in tables {
            let artifact = target.render_artifact(table, namespace);
            if !seen.insert(artifact.file_name.clone()) {
                warn!(
                    "{}.{} overwrites {} generated earlier in this run",
                    table.schema, table.name, artifact.file_name
                );
            }
            write_artifact(store, &artifact.file_name, &artifact.content)?;
            report.written.push(artifact.file_name);
        }

        let existing = store.list().map_err(ScaffoldError::Store)?;
        report.sync = synchronize_artifacts(store, &existing, target, tables, safe_mode);

        let index = target.render_index(tables, namespace);
        write_artifact(store, &index.file_name, &index.content)?;
        report.index = index.file_name;

        Ok(report)
    }
}

fn write_artifact<S: ArtifactStore + ?Sized>(store: &mut S, name: &str, content: &str) -> Result<()> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::write_artifact_span(name).entered();

    store.write(name, content).map_err(ScaffoldError::ArtifactWrite)?;
    info!("Generated {}", name);
    Ok(())
}

/// Models declared in the managed artifacts of `store`, in file name order.
///
/// Unreadable files are logged and skipped.
fn discover_models<S: ArtifactStore + ?Sized>(
    store: &S,
    target: &dyn TargetLanguage,
    models_namespace: &str,
) -> Result<Vec<DiscoveredModel>> {
    let mut models = Vec::new();
    for name in store.list().map_err(ScaffoldError::Store)? {
        if !target.is_managed_artifact(&name) {
            continue;
        }
        match store.read(&name) {
            Ok(content) => {
                if let Some(model) = target.discover_model(&name, &content, models_namespace) {
                    models.push(model);
                }
            }
            Err(e) => warn!("Skipping {}: {}", name, e),
        }
    }
    Ok(models)
}

fn log_summary(database_name: &str, report: &GenerationReport) {
    info!(
        "Generated {} model(s) for {} ({} obsolete, {} deleted)",
        report.written.len(),
        database_name,
        report.sync.obsolete.len(),
        report.sync.deleted.len()
    );
    for failure in &report.sync.failures {
        warn!("{}", failure);
    }
}
