//! Row model for the `task_results` table.

use jobq_core::result_store::TaskResult;
use jobq_core::types::{JobId, Timestamp};
use sqlx::FromRow;

/// A row from the `task_results` table.
#[derive(Debug, Clone, FromRow)]
pub struct TaskResultRow {
    pub id: uuid::Uuid,
    pub job_id: JobId,
    pub job_type_name: String,
    pub result: serde_json::Value,
    pub created_at: Timestamp,
}

impl From<TaskResultRow> for TaskResult {
    fn from(row: TaskResultRow) -> Self {
        TaskResult {
            id: row.id,
            job_id: row.job_id,
            job_type_name: row.job_type_name,
            result: row.result,
            created_at: row.created_at,
        }
    }
}
