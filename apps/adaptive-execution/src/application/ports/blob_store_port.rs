//! Blob Store Port (Driven Port)
//!
//! Minimal key/value persistence used for execution bookkeeping.

use async_trait::async_trait;

/// Blob store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobStoreError {
    /// Read failed.
    #[error("Failed to read blob '{key}': {message}")]
    ReadFailed {
        /// Blob key.
        key: String,
        /// Error details.
        message: String,
    },

    /// Write failed.
    #[error("Failed to write blob '{key}': {message}")]
    WriteFailed {
        /// Blob key.
        key: String,
        /// Error details.
        message: String,
    },

    /// Key is not a valid blob name.
    #[error("Invalid blob key: {key}")]
    InvalidKey {
        /// Offending key.
        key: String,
    },
}

/// Port for blob persistence.
#[async_trait]
pub trait BlobStorePort: Send + Sync {
    /// Read a blob; `None` if it does not exist.
    async fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>, BlobStoreError>;

    /// Create or replace a blob.
    async fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<(), BlobStoreError>;
}
