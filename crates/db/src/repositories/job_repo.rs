//! Repository for the `jobs` table.
//!
//! Uses `JobStatus` from `models::status` for all status transitions.
//! Every terminal update is guarded by `status_id = running`, so a job can
//! never move backwards or be finished twice.

use jobq_core::types::{JobId, Timestamp};
use sqlx::PgPool;

use crate::models::job::Job;
use crate::models::status::JobStatus;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, job_type, status_id, payload, result, \
    error_kind, error_message, error_details, worker, \
    submitted_at, claimed_at, heartbeat_at, completed_at";

/// Provides queue operations for dispatched jobs.
pub struct JobRepo;

impl JobRepo {
    /// Insert a new pending job. Returns immediately with the job row.
    pub async fn submit(
        pool: &PgPool,
        job_type: &str,
        payload: &serde_json::Value,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (id, job_type, status_id, payload) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(uuid::Uuid::new_v4())
            .bind(job_type)
            .bind(JobStatus::Pending.id())
            .bind(payload)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the oldest pending job for a worker.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent workers never
    /// claim the same row.
    pub async fn claim_next(pool: &PgPool, worker: &str) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs \
             SET worker = $1, claimed_at = NOW(), heartbeat_at = NOW(), status_id = $2 \
             WHERE id = ( \
                 SELECT id FROM jobs \
                 WHERE status_id = $3 \
                 ORDER BY submitted_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(worker)
            .bind(JobStatus::Running.id())
            .bind(JobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Mark a running job as succeeded with its return value.
    ///
    /// Returns `false` if the job was not running.
    pub async fn complete(
        pool: &PgPool,
        job_id: JobId,
        result: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, result = $3, completed_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(job_id)
        .bind(JobStatus::Succeeded.id())
        .bind(result)
        .bind(JobStatus::Running.id())
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    /// Mark a running job as failed with its error classification.
    ///
    /// No automatic retry is performed; a retry is a fresh submission.
    /// Returns `false` if the job was not running.
    pub async fn fail(
        pool: &PgPool,
        job_id: JobId,
        error_kind: &str,
        error_message: &str,
        error_details: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, error_kind = $3, error_message = $4, \
                 error_details = $5, completed_at = NOW() \
             WHERE id = $1 AND status_id = $6",
        )
        .bind(job_id)
        .bind(JobStatus::Failed.id())
        .bind(error_kind)
        .bind(error_message)
        .bind(error_details)
        .bind(JobStatus::Running.id())
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    /// Refresh the heartbeat of a running job.
    ///
    /// Returns `false` if the job was not running.
    pub async fn heartbeat(pool: &PgPool, job_id: JobId) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE jobs SET heartbeat_at = NOW() \
             WHERE id = $1 AND status_id = $2",
        )
        .bind(job_id)
        .bind(JobStatus::Running.id())
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    /// Running jobs whose last heartbeat is older than `cutoff`.
    pub async fn find_stale_running(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE status_id = $1 AND COALESCE(heartbeat_at, claimed_at) < $2 \
             ORDER BY claimed_at ASC"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(JobStatus::Running.id())
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: JobId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete succeeded and failed jobs completed before `cutoff`.
    pub async fn delete_finished_before(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let outcome = sqlx::query(
            "DELETE FROM jobs \
             WHERE status_id IN ($1, $2) AND completed_at < $3",
        )
        .bind(JobStatus::Succeeded.id())
        .bind(JobStatus::Failed.id())
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected())
    }
}
