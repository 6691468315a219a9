//! Directory-backed blob store.
//!
//! Each key is one file under the root directory. Writes land in a sibling
//! `.tmp` file that is renamed into place, so readers never observe a
//! partially written blob.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{BlobStoreError, BlobStorePort};

/// `BlobStorePort` storing one file per key.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Store rooted at `root`; the directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobStoreError> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.ends_with(".tmp")
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(BlobStoreError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStorePort for FileBlobStore {
    async fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>, BlobStoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BlobStoreError::ReadFailed {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn write_blob(&self, key: &str, bytes: &[u8]) -> Result<(), BlobStoreError> {
        let path = self.path_for(key)?;
        let write_failed = |e: std::io::Error| BlobStoreError::WriteFailed {
            key: key.to_string(),
            message: e.to_string(),
        };

        fs::create_dir_all(&self.root).await.map_err(write_failed)?;

        let tmp_path = self.root.join(format!("{key}.tmp"));
        fs::write(&tmp_path, bytes).await.map_err(write_failed)?;
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_failed(e));
        }

        tracing::debug!(key, bytes = bytes.len(), path = %path.display(), "Blob written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[tokio::test]
    async fn missing_blob_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().join("state"));

        assert_eq!(store.read_blob("execution_attempts.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_creates_root_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().join("nested").join("state"));

        store.write_blob("attempts.json", b"{}").await.unwrap();
        store.write_blob("attempts.json", b"{\"a\":1}").await.unwrap();

        assert_eq!(
            store.read_blob("attempts.json").await.unwrap(),
            Some(b"{\"a\":1}".to_vec())
        );
        assert!(!store.root().join("attempts.json.tmp").exists());
    }

    #[test_case("" ; "empty")]
    #[test_case(".." ; "parent")]
    #[test_case("../escape.json" ; "traversal")]
    #[test_case("dir/file.json" ; "separator")]
    #[test_case("file.json.tmp" ; "temp suffix")]
    fn rejects_unsafe_keys(key: &str) {
        let store = FileBlobStore::new("/tmp/unused");
        assert!(matches!(
            store.path_for(key),
            Err(BlobStoreError::InvalidKey { .. })
        ));
    }
}
