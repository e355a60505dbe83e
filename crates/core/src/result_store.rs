//! Durable storage for completed job outputs.
//!
//! At most one [`TaskResult`] exists per job; a second save for the same job
//! fails with [`StoreError::DuplicateResult`] and leaves the first intact.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{JobId, Timestamp};

/// Maximum page size for result listing.
pub const MAX_LIMIT: i64 = 100;

/// Default page size for result listing.
pub const DEFAULT_LIMIT: i64 = 50;

/// A persisted job output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub id: uuid::Uuid,
    pub job_id: JobId,
    pub job_type_name: String,
    pub result: serde_json::Value,
    pub created_at: Timestamp,
}

/// Filter and pagination for [`ResultStore::list`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultQuery {
    pub job_type_name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ResultQuery {
    /// Effective limit: defaults to 50, clamped to `1..=100`.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("A result for job {0} already exists")]
    DuplicateResult(JobId),

    #[error("No result stored for job {0}")]
    NotFound(JobId),

    #[error("Result store failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist the output of a finished job.
    async fn save(
        &self,
        job_id: JobId,
        job_type_name: &str,
        result: &serde_json::Value,
    ) -> Result<TaskResult, StoreError>;

    async fn get(&self, job_id: JobId) -> Result<TaskResult, StoreError>;

    /// Newest first.
    async fn list(&self, query: &ResultQuery) -> Result<Vec<TaskResult>, StoreError>;
}
