//! Persistent store for the watermark, changed-record queries, and run history

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStateStore;

use crate::core::{RecordSet, RunRecord};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from the persistent store
#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "sqlite")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Contract consumed by the engine and by steps that scope their work to
/// "what changed since the watermark"
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Newest comment id known to the store, or 0 when empty
    async fn latest_watermark(&self) -> Result<i64, StoreError>;

    /// Distinct consultation ids with comments newer than the watermark
    async fn consultations_changed_since(&self, watermark: i64) -> Result<RecordSet, StoreError>;

    /// Append a finalized run to the history table
    async fn record_run(&self, record: &RunRecord) -> Result<(), StoreError>;
}

/// In-memory store (for testing or ephemeral use)
///
/// Holds a fixed watermark and a comment-id -> consultation-id mapping,
/// mirroring what the SQLite schema joins together.
pub struct MemoryStateStore {
    watermark: tokio::sync::RwLock<i64>,
    comments: tokio::sync::RwLock<Vec<(i64, i64)>>,
    runs: tokio::sync::RwLock<Vec<RunRecord>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self {
            watermark: tokio::sync::RwLock::new(0),
            comments: tokio::sync::RwLock::new(Vec::new()),
            runs: tokio::sync::RwLock::new(Vec::new()),
        }
    }

    /// Insert a comment id belonging to a consultation
    pub async fn insert_comment(&self, comment_id: i64, consultation_id: i64) {
        self.comments.write().await.push((comment_id, consultation_id));
        let mut watermark = self.watermark.write().await;
        if comment_id > *watermark {
            *watermark = comment_id;
        }
    }

    /// Runs recorded so far
    pub async fn recorded_runs(&self) -> Vec<RunRecord> {
        self.runs.read().await.clone()
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn latest_watermark(&self) -> Result<i64, StoreError> {
        Ok(*self.watermark.read().await)
    }

    async fn consultations_changed_since(&self, watermark: i64) -> Result<RecordSet, StoreError> {
        let comments = self.comments.read().await;
        Ok(comments
            .iter()
            .filter(|(comment_id, _)| *comment_id > watermark)
            .map(|(_, consultation_id)| *consultation_id)
            .collect())
    }

    async fn record_run(&self, record: &RunRecord) -> Result<(), StoreError> {
        self.runs.write().await.push(record.clone());
        Ok(())
    }
}

/// Store that fails every query, for exercising watermark-failure paths
pub struct UnavailableStateStore;

#[async_trait]
impl StateStore for UnavailableStateStore {
    async fn latest_watermark(&self) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn consultations_changed_since(&self, _watermark: i64) -> Result<RecordSet, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn record_run(&self, _record: &RunRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}
