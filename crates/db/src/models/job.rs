//! Row model for the `jobs` broker table.

use jobq_core::job_state::{ClaimedJob, ErrorKind, JobFailure, JobSnapshot, JobState};
use jobq_core::types::{JobId, Timestamp};
use sqlx::FromRow;

use super::status::{JobStatus, StatusId};

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow)]
pub struct Job {
    pub id: JobId,
    pub job_type: String,
    pub status_id: StatusId,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub error_details: Option<serde_json::Value>,
    pub worker: Option<String>,
    pub submitted_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub heartbeat_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl Job {
    /// Lifecycle state, or `None` if the row carries an unseeded status id.
    pub fn state(&self) -> Option<JobState> {
        JobStatus::from_id(self.status_id).map(JobState::from)
    }

    /// Failure metadata, present only on failed rows.
    ///
    /// Rows written with an unrecognised `error_kind` are reported as
    /// execution errors.
    pub fn failure(&self) -> Option<JobFailure> {
        if self.state() != Some(JobState::Failed) {
            return None;
        }
        let kind = self
            .error_kind
            .as_deref()
            .and_then(ErrorKind::from_name)
            .unwrap_or(ErrorKind::ExecutionError);
        Some(JobFailure {
            kind,
            message: self.error_message.clone().unwrap_or_default(),
            details: self
                .error_details
                .clone()
                .unwrap_or(serde_json::Value::Null),
        })
    }

    pub fn to_snapshot(&self) -> Option<JobSnapshot> {
        Some(JobSnapshot {
            id: self.id,
            job_type: self.job_type.clone(),
            state: self.state()?,
            result: self.result.clone(),
            failure: self.failure(),
            submitted_at: self.submitted_at,
            completed_at: self.completed_at,
        })
    }

    pub fn into_claimed(self) -> ClaimedJob {
        ClaimedJob {
            id: self.id,
            job_type: self.job_type,
            payload: self.payload,
        }
    }
}
