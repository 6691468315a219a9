//! In-memory blob store for tests and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{BlobStoreError, BlobStorePort};

/// `BlobStorePort` over a `HashMap`, with switchable failure injection.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw contents of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.read().get(key).cloned()
    }

    /// Seed `key` directly, bypassing failure injection.
    pub fn insert(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.blobs.write().insert(key.into(), bytes);
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Make reads fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStorePort for InMemoryBlobStore {
    async fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>, BlobStoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BlobStoreError::ReadFailed {
                key: key.to_string(),
                message: "simulated read failure".to_string(),
            });
        }
        Ok(self.get(key))
    }

    async fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<(), BlobStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BlobStoreError::WriteFailed {
                key: key.to_string(),
                message: "simulated write failure".to_string(),
            });
        }
        self.insert(key, bytes.to_vec());
        Ok(())
    }
}
