//! [`ResultStore`] backed by the `task_results` table.
//!
//! Uniqueness per job is enforced by the database constraint, so concurrent
//! saves from different workers need no extra locking.

use async_trait::async_trait;
use jobq_core::result_store::{ResultQuery, ResultStore, StoreError, TaskResult};
use jobq_core::types::JobId;

use crate::repositories::task_result_repo::UNIQUE_JOB_CONSTRAINT;
use crate::repositories::TaskResultRepo;
use crate::DbPool;

/// PostgreSQL unique violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgResultStore {
    pool: DbPool,
}

impl PgResultStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Whether `err` is the one-result-per-job constraint firing.
fn is_duplicate_result(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                && db_err.constraint() == Some(UNIQUE_JOB_CONSTRAINT)
        }
        _ => false,
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn save(
        &self,
        job_id: JobId,
        job_type_name: &str,
        result: &serde_json::Value,
    ) -> Result<TaskResult, StoreError> {
        match TaskResultRepo::insert(&self.pool, job_id, job_type_name, result).await {
            Ok(row) => Ok(row.into()),
            Err(e) if is_duplicate_result(&e) => Err(StoreError::DuplicateResult(job_id)),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }

    async fn get(&self, job_id: JobId) -> Result<TaskResult, StoreError> {
        TaskResultRepo::find_by_job_id(&self.pool, job_id)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .map(TaskResult::from)
            .ok_or(StoreError::NotFound(job_id))
    }

    async fn list(&self, query: &ResultQuery) -> Result<Vec<TaskResult>, StoreError> {
        let rows = TaskResultRepo::list(&self.pool, query)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(rows.into_iter().map(TaskResult::from).collect())
    }
}
