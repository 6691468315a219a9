//! Execution Idempotency Store
//!
//! Remembers which (correlation id, plan hash) pairs have already been
//! executed so a replayed request becomes a no-op. All records live in one
//! JSON object stored under a single blob key.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::application::ports::{BlobStoreError, BlobStorePort};
use crate::domain::order_execution::{ErrorKind, ExecutionError};
use crate::domain::shared::{CorrelationId, PlanHash};

/// Default blob key holding the attempt records.
pub const EXECUTION_ATTEMPTS_KEY: &str = "execution_attempts.json";

/// One recorded execution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionAttemptRecord {
    /// Whether any recorded attempt succeeded.
    pub success: bool,
    /// When the pair was first recorded.
    pub first_attempt_at: DateTime<Utc>,
    /// When the pair was last recorded.
    pub last_attempt_at: DateTime<Utc>,
    /// Number of recorded attempts.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Free-form details of the latest attempt.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

const fn default_attempts() -> u32 {
    1
}

/// Errors loading or saving the record blob.
#[derive(Debug, Error)]
pub enum IdempotencyError {
    /// Underlying blob store failed.
    #[error(transparent)]
    Storage(#[from] BlobStoreError),

    /// Blob content is not a valid record map.
    #[error("Corrupt execution attempt records: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<IdempotencyError> for ExecutionError {
    fn from(err: IdempotencyError) -> Self {
        Self::new(ErrorKind::Persistence, err.to_string())
    }
}

/// Idempotency guard over a blob store.
pub struct ExecutionIdempotencyStore {
    store: Arc<dyn BlobStorePort>,
    key: String,
    // Serializes read-merge-write across concurrent sequences
    lock: Mutex<()>,
    in_flight: parking_lot::Mutex<HashSet<String>>,
}

/// Marks a pair as executing in this process until dropped.
#[must_use = "the pair is released as soon as the claim is dropped"]
pub struct ExecutionClaim<'a> {
    in_flight: &'a parking_lot::Mutex<HashSet<String>>,
    key: String,
}

impl Drop for ExecutionClaim<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.key);
    }
}

impl ExecutionIdempotencyStore {
    /// Create a store using the default blob key.
    pub fn new(store: Arc<dyn BlobStorePort>) -> Self {
        Self::with_key(store, EXECUTION_ATTEMPTS_KEY)
    }

    /// Create a store using a custom blob key.
    pub fn with_key(store: Arc<dyn BlobStorePort>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            lock: Mutex::new(()),
            in_flight: parking_lot::Mutex::new(HashSet::new()),
        }
    }

    /// Claim a pair for execution.
    ///
    /// Returns `None` while another claim on the same pair is alive. Hold the
    /// claim from the executed check until the attempt is recorded.
    pub fn claim(&self, correlation_id: &CorrelationId, plan_hash: &PlanHash) -> Option<ExecutionClaim<'_>> {
        let key = Self::record_key(correlation_id, plan_hash);
        if !self.in_flight.lock().insert(key.clone()) {
            return None;
        }
        Some(ExecutionClaim {
            in_flight: &self.in_flight,
            key,
        })
    }

    fn record_key(correlation_id: &CorrelationId, plan_hash: &PlanHash) -> String {
        format!("{correlation_id}_{plan_hash}")
    }

    /// Returns true if the pair has been recorded.
    ///
    /// Storage failures read as "not executed".
    pub async fn has_been_executed(&self, correlation_id: &CorrelationId, plan_hash: &PlanHash) -> bool {
        let _guard = self.lock.lock().await;
        match self.load().await {
            Ok(records) => records.contains_key(&Self::record_key(correlation_id, plan_hash)),
            Err(e) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    plan_hash = %plan_hash,
                    error = %e,
                    "Idempotency check failed, treating as not executed"
                );
                false
            }
        }
    }

    /// Fetch the record for a pair, if present and readable.
    pub async fn get_record(
        &self,
        correlation_id: &CorrelationId,
        plan_hash: &PlanHash,
    ) -> Option<ExecutionAttemptRecord> {
        let _guard = self.lock.lock().await;
        self.load()
            .await
            .ok()
            .and_then(|mut records| records.remove(&Self::record_key(correlation_id, plan_hash)))
    }

    /// Record an attempt for a pair.
    ///
    /// The first record of a pair is kept; later ones bump the attempt count.
    /// Failures are logged and swallowed. When the existing blob cannot be
    /// read nothing is written, so unreadable records are never clobbered.
    pub async fn record_attempt(
        &self,
        correlation_id: &CorrelationId,
        plan_hash: &PlanHash,
        success: bool,
        metadata: HashMap<String, String>,
    ) {
        let _guard = self.lock.lock().await;

        let mut records = match self.load().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(
                    correlation_id = %correlation_id,
                    plan_hash = %plan_hash,
                    error = %e,
                    "Failed to load execution attempts, attempt not recorded"
                );
                return;
            }
        };

        let now = Utc::now();
        records
            .entry(Self::record_key(correlation_id, plan_hash))
            .and_modify(|record| {
                record.success |= success;
                record.last_attempt_at = now;
                record.attempts = record.attempts.saturating_add(1);
                record.metadata.clone_from(&metadata);
            })
            .or_insert_with(|| ExecutionAttemptRecord {
                success,
                first_attempt_at: now,
                last_attempt_at: now,
                attempts: 1,
                metadata,
            });

        if let Err(e) = self.save(&records).await {
            tracing::error!(
                correlation_id = %correlation_id,
                plan_hash = %plan_hash,
                error = %e,
                "Failed to record execution attempt"
            );
        }
    }

    async fn load(&self) -> Result<HashMap<String, ExecutionAttemptRecord>, IdempotencyError> {
        match self.store.read_blob(&self.key).await? {
            Some(bytes) if !bytes.is_empty() => Ok(serde_json::from_slice(&bytes)?),
            _ => Ok(HashMap::new()),
        }
    }

    async fn save(&self, records: &HashMap<String, ExecutionAttemptRecord>) -> Result<(), IdempotencyError> {
        let bytes = serde_json::to_vec_pretty(records)?;
        self.store.write_blob(&self.key, &bytes).await?;
        Ok(())
    }
}
