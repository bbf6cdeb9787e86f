//! Object store abstraction
//!
//! The flusher only needs `put(bucket, key, body, content_type)`. Backends:
//! - [`MemoryObjectStore`]: in-process, records write order (tests, embedding)
//! - [`LocalObjectStore`]: `root/bucket/key` on the local filesystem
//!
//! Remote backends implement [`ObjectStore`] and map their failures to
//! [`Error::Store`](crate::Error::Store).
//!
//! # Example
//!
//! ```rust
//! use trueno_tag::store::{MemoryObjectStore, ObjectStore};
//!
//! let store = MemoryObjectStore::new();
//! store.put("proj", "exp/t1/summary.json", b"{}".to_vec(), "application/json")?;
//!
//! let object = store.get("proj", "exp/t1/summary.json")?.unwrap();
//! assert_eq!(object.content_type, "application/json");
//! # Ok::<(), trueno_tag::Error>(())
//! ```

mod local;
mod memory;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

use crate::Result;

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Raw bytes
    pub body: Vec<u8>,
    /// MIME content type given at write time
    pub content_type: String,
}

/// Blocking bucket/key object store.
pub trait ObjectStore: Send + Sync {
    /// Write `body` under `bucket`/`key`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`](crate::Error::Store) if the write is rejected.
    fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// Read an object back. `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>>;
}

impl<S: ObjectStore + ?Sized> ObjectStore for &S {
    fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        (**self).put(bucket, key, body, content_type)
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>> {
        (**self).get(bucket, key)
    }
}
