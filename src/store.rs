//! Artifact stores
//!
//! An [`ArtifactStore`] is a flat namespace of named text artifacts. The
//! generator writes models, the index and context files through it, and
//! synchronization lists and deletes through it.

use crate::error::StoreError;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub trait ArtifactStore {
    /// Names of the artifacts currently present, sorted.
    fn list(&self) -> Result<BTreeSet<String>, StoreError>;

    fn read(&self, name: &str) -> Result<String, StoreError>;

    /// Create or overwrite `name`.
    fn write(&mut self, name: &str, content: &str) -> Result<(), StoreError>;

    fn delete(&mut self, name: &str) -> Result<(), StoreError>;
}

/// Artifacts as regular files in one directory.
///
/// Subdirectories are not artifacts and are never listed.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open `root`, creating it (and its parents) if missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Prepare {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl ArtifactStore for DirectoryStore {
    fn list(&self) -> Result<BTreeSet<String>, StoreError> {
        let list_err = |source| StoreError::List {
            path: self.root.clone(),
            source,
        };

        let mut names = BTreeSet::new();
        for entry in fs::read_dir(&self.root).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            if !entry.file_type().map_err(list_err)?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.insert(name.to_string());
            }
        }
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<String, StoreError> {
        fs::read_to_string(self.path_of(name)).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
            _ => StoreError::Read {
                name: name.to_string(),
                source,
            },
        })
    }

    fn write(&mut self, name: &str, content: &str) -> Result<(), StoreError> {
        let path = self.path_of(name);
        fs::write(&path, content).map_err(|source| StoreError::Write {
            name: name.to_string(),
            source,
        })?;
        debug!("Wrote {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        fs::remove_file(self.path_of(name)).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
            _ => StoreError::Delete {
                name: name.to_string(),
                source,
            },
        })
    }
}

/// In-memory store for tests and dry runs.
///
/// Individual names can be made to fail on write or delete.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    artifacts: BTreeMap<String, String>,
    failing_writes: BTreeSet<String>,
    failing_deletes: BTreeSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.artifacts.insert(name.into(), content.into());
        self
    }

    /// Make every write of `name` fail with a permission error.
    pub fn fail_write(mut self, name: impl Into<String>) -> Self {
        self.failing_writes.insert(name.into());
        self
    }

    /// Make every delete of `name` fail with a permission error.
    pub fn fail_delete(mut self, name: impl Into<String>) -> Self {
        self.failing_deletes.insert(name.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.artifacts.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

fn denied() -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, "permission denied")
}

impl ArtifactStore for MemoryStore {
    fn list(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.artifacts.keys().cloned().collect())
    }

    fn read(&self, name: &str) -> Result<String, StoreError> {
        self.artifacts
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn write(&mut self, name: &str, content: &str) -> Result<(), StoreError> {
        if self.failing_writes.contains(name) {
            return Err(StoreError::Write {
                name: name.to_string(),
                source: denied(),
            });
        }
        self.artifacts.insert(name.to_string(), content.to_string());
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        if self.failing_deletes.contains(name) {
            return Err(StoreError::Delete {
                name: name.to_string(),
                source: denied(),
            });
        }
        self.artifacts
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_store_creates_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("src").join("models");
        let store = DirectoryStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_directory_store_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mut store = DirectoryStore::open(tmp.path()).unwrap();

        store.write("orders_model.rs", "pub struct Orders;\n").unwrap();
        assert_eq!(store.read("orders_model.rs").unwrap(), "pub struct Orders;\n");

        store.write("orders_model.rs", "pub struct Orders {}\n").unwrap();
        assert_eq!(store.read("orders_model.rs").unwrap(), "pub struct Orders {}\n");

        store.delete("orders_model.rs").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_directory_store_lists_files_only() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("nested_model.rs")).unwrap();
        fs::write(tmp.path().join("a_model.rs"), "").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();

        let store = DirectoryStore::open(tmp.path()).unwrap();
        let names: Vec<_> = store.list().unwrap().into_iter().collect();
        assert_eq!(names, vec!["a_model.rs", "notes.txt"]);
    }

    #[test]
    fn test_directory_store_missing_artifact() {
        let tmp = TempDir::new().unwrap();
        let mut store = DirectoryStore::open(tmp.path()).unwrap();
        assert!(matches!(store.read("gone.rs"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("gone.rs"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_memory_store_failure_injection() {
        let mut store = MemoryStore::new()
            .with_artifact("OrdersModel.cs", "class OrdersModel {}")
            .fail_delete("OrdersModel.cs")
            .fail_write("LockedModel.cs");

        assert!(matches!(store.delete("OrdersModel.cs"), Err(StoreError::Delete { .. })));
        assert_eq!(store.len(), 1);
        assert!(matches!(store.write("LockedModel.cs", ""), Err(StoreError::Write { .. })));
        assert!(store.get("LockedModel.cs").is_none());
    }
}
