//! Execution bookkeeping persistence configuration.

use serde::{Deserialize, Serialize};

use crate::application::services::EXECUTION_ATTEMPTS_KEY;

/// Where execution attempt records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobStoreKind {
    /// Process memory; nothing survives a restart.
    #[default]
    Memory,
    /// One file per key under `path`.
    File,
    /// No idempotency tracking.
    Disabled,
}

/// The `persistence` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Blob store backend.
    #[serde(default)]
    pub kind: BlobStoreKind,
    /// Root directory for the file backend.
    #[serde(default = "default_path")]
    pub path: String,
    /// Blob key holding the attempt records.
    #[serde(default = "default_attempts_key")]
    pub attempts_key: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            kind: BlobStoreKind::default(),
            path: default_path(),
            attempts_key: default_attempts_key(),
        }
    }
}

fn default_path() -> String {
    "./data/execution".to_string()
}

fn default_attempts_key() -> String {
    EXECUTION_ATTEMPTS_KEY.to_string()
}
