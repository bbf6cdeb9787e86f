//! In-memory object store using `DashMap`.
//!
//! Data is lost on process restart. Every write is also appended to a write
//! log so callers can assert on what a flush pushed, and in which order.

use std::sync::Mutex;

use dashmap::DashMap;

use super::{ObjectStore, StoredObject};
use crate::{Error, Result};

/// In-memory object store.
///
/// # Example
///
/// ```rust
/// use trueno_tag::store::{MemoryObjectStore, ObjectStore};
///
/// let store = MemoryObjectStore::new();
/// store.put("proj", "exp/t/a.bin", vec![1], "application/octet-stream")?;
/// store.put("proj", "exp/t/a.bin", vec![2], "application/octet-stream")?;
///
/// assert_eq!(store.len(), 1);
/// assert_eq!(store.writes().len(), 2);
/// # Ok::<(), trueno_tag::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<(String, String), StoredObject>,
    log: Mutex<Vec<(String, String)>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Sorted keys stored in `bucket`.
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .iter()
            .filter(|entry| entry.key().0 == bucket)
            .map(|entry| entry.key().1.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Every `(bucket, key)` write in order, overwrites included.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, String)> {
        self.log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Remove all objects and clear the write log.
    pub fn clear(&self) {
        self.objects.clear();
        self.log
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let id = (bucket.to_string(), key.to_string());
        self.log
            .lock()
            .map_err(|e| Error::Store {
                key: key.to_string(),
                reason: e.to_string(),
            })?
            .push(id.clone());
        self.objects.insert(
            id,
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>> {
        let id = (bucket.to_string(), key.to_string());
        Ok(self.objects.get(&id).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get() {
        let store = MemoryObjectStore::new();
        store.put("p", "e/t/x.csv", b"a,b\n1,2\n".to_vec(), "text/csv").unwrap();

        let object = store.get("p", "e/t/x.csv").unwrap().unwrap();
        assert_eq!(object.body, b"a,b\n1,2\n");
        assert_eq!(object.content_type, "text/csv");
    }

    #[test]
    fn test_get_missing() {
        let store = MemoryObjectStore::new();
        assert!(store.get("p", "nope").unwrap().is_none());
    }

    #[test]
    fn test_buckets_are_separate() {
        let store = MemoryObjectStore::new();
        store.put("p1", "k", vec![1], "application/octet-stream").unwrap();
        store.put("p2", "k", vec![2], "application/octet-stream").unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("p1", "k").unwrap().unwrap().body, vec![1]);
        assert_eq!(store.keys("p2"), vec!["k".to_string()]);
    }

    #[test]
    fn test_overwrite_logged() {
        let store = MemoryObjectStore::new();
        store.put("p", "k", vec![1], "a").unwrap();
        store.put("p", "k", vec![2], "b").unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.writes().len(), 2);
        assert_eq!(store.get("p", "k").unwrap().unwrap().content_type, "b");
    }

    #[test]
    fn test_clear() {
        let store = MemoryObjectStore::new();
        store.put("p", "k", vec![1], "a").unwrap();
        store.clear();
        assert!(store.is_empty());
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_clear_recovers_poisoned_log() {
        let store = MemoryObjectStore::new();
        store.put("p", "k", vec![1], "a").unwrap();

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.log.lock().unwrap();
            panic!("writer died holding the log");
        }));
        assert!(poisoned.is_err());
        assert!(store.log.is_poisoned());

        store.clear();
        assert!(store.is_empty());
        assert!(store.writes().is_empty());
    }
}
