//! Repository for the `task_results` table.

use jobq_core::result_store::ResultQuery;
use jobq_core::types::JobId;
use sqlx::PgPool;

use crate::models::task_result::TaskResultRow;

/// Column list for `task_results` queries.
const COLUMNS: &str = "id, job_id, job_type_name, result, created_at";

/// Name of the unique constraint guarding one result per job.
pub const UNIQUE_JOB_CONSTRAINT: &str = "uq_task_results_job_id";

pub struct TaskResultRepo;

impl TaskResultRepo {
    /// Insert a result row. A second insert for the same `job_id` violates
    /// [`UNIQUE_JOB_CONSTRAINT`].
    pub async fn insert(
        pool: &PgPool,
        job_id: JobId,
        job_type_name: &str,
        result: &serde_json::Value,
    ) -> Result<TaskResultRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO task_results (id, job_id, job_type_name, result) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskResultRow>(&query)
            .bind(uuid::Uuid::new_v4())
            .bind(job_id)
            .bind(job_type_name)
            .bind(result)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_job_id(
        pool: &PgPool,
        job_id: JobId,
    ) -> Result<Option<TaskResultRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM task_results WHERE job_id = $1");
        sqlx::query_as::<_, TaskResultRow>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// List results newest first, optionally filtered by job type.
    pub async fn list(
        pool: &PgPool,
        params: &ResultQuery,
    ) -> Result<Vec<TaskResultRow>, sqlx::Error> {
        let (where_clause, limit_idx) = if params.job_type_name.is_some() {
            ("WHERE job_type_name = $1", 2)
        } else {
            ("", 1)
        };

        let query = format!(
            "SELECT {COLUMNS} FROM task_results \
             {where_clause} \
             ORDER BY created_at DESC \
             LIMIT ${limit_idx} OFFSET ${}",
            limit_idx + 1,
        );

        let mut q = sqlx::query_as::<_, TaskResultRow>(&query);
        if let Some(name) = &params.job_type_name {
            q = q.bind(name);
        }
        q.bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
    }
}
