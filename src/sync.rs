//! Obsolete artifact synchronization
//!
//! After a run has written one artifact per table, any managed artifact in
//! the models directory whose name is not among the new artifact names
//! belongs to a table that no longer exists.

use crate::emit::TargetLanguage;
use crate::error::StaleArtifactCleanupError;
use crate::schema::TableDescriptor;
use crate::store::ArtifactStore;
use log::{error, info, warn};
use std::collections::BTreeSet;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Outcome of one synchronization pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Managed artifacts with no table, in name order
    pub obsolete: Vec<String>,
    /// Obsolete artifacts actually removed
    pub deleted: Vec<String>,
    pub failures: Vec<StaleArtifactCleanupError>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Managed names in `existing` with no artifact among `tables`.
pub fn obsolete_artifacts<'a, I>(
    existing: I,
    language: &dyn TargetLanguage,
    tables: &[TableDescriptor],
) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let current: BTreeSet<String> = tables
        .iter()
        .map(|t| language.artifact_file_name(t))
        .collect();

    let obsolete: BTreeSet<&String> = existing
        .into_iter()
        .filter(|name| language.is_managed_artifact(name))
        .filter(|name| !current.contains(*name))
        .collect();

    obsolete.into_iter().cloned().collect()
}

/// Remove (or, in safe mode, only report) obsolete artifacts in `store`.
///
/// A failed delete is logged and recorded; the remaining deletes still run.
pub fn synchronize_artifacts<S: ArtifactStore + ?Sized>(
    store: &mut S,
    existing: &BTreeSet<String>,
    language: &dyn TargetLanguage,
    tables: &[TableDescriptor],
    safe_mode: bool,
) -> SyncReport {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::synchronize_span(safe_mode).entered();

    let mut report = SyncReport {
        obsolete: obsolete_artifacts(existing, language, tables),
        ..SyncReport::default()
    };

    for name in &report.obsolete {
        if safe_mode {
            warn!("Safe mode: obsolete artifact {} was not deleted", name);
            continue;
        }

        match store.delete(name) {
            Ok(()) => {
                info!("Deleted obsolete artifact {}", name);
                report.deleted.push(name.clone());
            }
            Err(e) => {
                error!("Failed to delete obsolete artifact {}: {}", name, e);
                report.failures.push(StaleArtifactCleanupError {
                    file_name: name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{CSharp, Rust};
    use crate::store::MemoryStore;
    use proptest::prelude::*;

    fn tables(names: &[&str]) -> Vec<TableDescriptor> {
        names.iter().map(|n| TableDescriptor::new("dbo", *n)).collect()
    }

    #[test]
    fn test_obsolete_ignores_unmanaged_files() {
        let existing: BTreeSet<String> = ["OrdersModel.cs", "GlobalUsings.cs", "Helpers.cs", "EmployeesModel.cs"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let obsolete = obsolete_artifacts(&existing, &CSharp, &tables(&["Employees"]));
        assert_eq!(obsolete, vec!["OrdersModel.cs"]);
    }

    #[test]
    fn test_delete_obsolete() {
        let mut store = MemoryStore::new()
            .with_artifact("orders_model.rs", "")
            .with_artifact("employees_model.rs", "")
            .with_artifact("mod.rs", "");
        let existing = store.list().unwrap();

        let report = synchronize_artifacts(&mut store, &existing, &Rust, &tables(&["Employees"]), false);
        assert_eq!(report.obsolete, vec!["orders_model.rs"]);
        assert_eq!(report.deleted, vec!["orders_model.rs"]);
        assert!(report.is_clean());
        assert!(store.get("orders_model.rs").is_none());
        assert!(store.get("mod.rs").is_some());
    }

    #[test]
    fn test_safe_mode_only_reports() {
        let mut store = MemoryStore::new().with_artifact("orders_model.rs", "keep me");
        let existing = store.list().unwrap();

        let report = synchronize_artifacts(&mut store, &existing, &Rust, &[], true);
        assert_eq!(report.obsolete, vec!["orders_model.rs"]);
        assert!(report.deleted.is_empty());
        assert_eq!(store.get("orders_model.rs"), Some("keep me"));
    }

    #[test]
    fn test_failed_delete_continues() {
        let mut store = MemoryStore::new()
            .with_artifact("a_model.rs", "")
            .with_artifact("b_model.rs", "")
            .fail_delete("a_model.rs");
        let existing = store.list().unwrap();

        let report = synchronize_artifacts(&mut store, &existing, &Rust, &[], false);
        assert_eq!(report.deleted, vec!["b_model.rs"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file_name, "a_model.rs");
        assert!(store.get("a_model.rs").is_some());
    }

    proptest! {
        #[test]
        fn safe_mode_is_idempotent(
            stale in proptest::collection::btree_set("[a-z]{1,8}", 0..6),
            live in proptest::collection::vec("[a-z]{1,8}", 0..6),
        ) {
            let mut store = MemoryStore::new();
            for name in &stale {
                store = store.with_artifact(format!("{name}_model.rs"), name.clone());
            }
            let live: Vec<&str> = live.iter().map(String::as_str).collect();
            let tables = tables(&live);
            let before = store.list().unwrap();

            let first = synchronize_artifacts(&mut store, &before, &Rust, &tables, true);
            let after_first = store.list().unwrap();
            let second = synchronize_artifacts(&mut store, &after_first, &Rust, &tables, true);

            prop_assert_eq!(&before, &after_first);
            prop_assert_eq!(&before, &store.list().unwrap());
            prop_assert_eq!(first.obsolete, second.obsolete);
            prop_assert!(first.deleted.is_empty() && second.deleted.is_empty());
        }
    }
}
