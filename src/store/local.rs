//! Filesystem object store: `root/bucket/key`.

use std::path::{Component, Path, PathBuf};

use dashmap::DashMap;

use super::{ObjectStore, StoredObject};
use crate::{Error, Result};

/// Object store rooted at a local directory.
///
/// Content types given at write time are remembered for the lifetime of the
/// store; objects found on disk without one are typed by extension.
#[derive(Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
    content_types: DashMap<PathBuf, String>,
}

impl LocalObjectStore {
    /// Store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            content_types: DashMap::new(),
        }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `bucket`/`key`, rejecting keys that escape the bucket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] for empty, absolute or `..` components.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for part in [bucket, key] {
            let relative = Path::new(part);
            let valid = !part.is_empty()
                && relative
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)));
            if !valid {
                return Err(Error::Store {
                    key: format!("{bucket}/{key}"),
                    reason: format!("invalid path component '{part}'"),
                });
            }
            path.push(relative);
        }
        Ok(path)
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("parquet") => "application/vnd.apache.parquet",
        _ => "application/octet-stream",
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        let store_err = |e: std::io::Error| Error::Store {
            key: key.to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(store_err)?;
        }
        std::fs::write(&path, body).map_err(store_err)?;
        self.content_types.insert(path, content_type.to_string());
        Ok(())
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>> {
        let path = self.object_path(bucket, key)?;
        if !path.is_file() {
            return Ok(None);
        }

        let body = std::fs::read(&path)?;
        let content_type = self
            .content_types
            .get(&path)
            .map_or_else(|| content_type_for(&path).to_string(), |ct| ct.value().clone());
        Ok(Some(StoredObject { body, content_type }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store
            .put("proj", "exp/t1/df.csv", b"a\n1\n".to_vec(), "text/csv")
            .unwrap();

        let on_disk = dir.path().join("proj").join("exp").join("t1").join("df.csv");
        assert_eq!(std::fs::read(on_disk).unwrap(), b"a\n1\n");

        let object = store.get("proj", "exp/t1/df.csv").unwrap().unwrap();
        assert_eq!(object.content_type, "text/csv");
    }

    #[test]
    fn test_rejects_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        let result = store.put("proj", "../escape.bin", vec![0], "application/octet-stream");
        assert!(matches!(result, Err(Error::Store { .. })));

        let result = store.put("", "k", vec![0], "application/octet-stream");
        assert!(matches!(result, Err(Error::Store { .. })));
    }

    #[test]
    fn test_content_type_guessed_for_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proj").join("e");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("summary.json"), b"{}").unwrap();

        let store = LocalObjectStore::new(dir.path());
        let object = store.get("proj", "e/summary.json").unwrap().unwrap();
        assert_eq!(object.content_type, "application/json");
        assert!(store.get("proj", "e/missing.csv").unwrap().is_none());
    }
}
