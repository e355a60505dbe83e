//! Errors raised by job handlers during execution.

use jobq_core::job_state::{ClaimedJob, ErrorKind, JobFailure};
use jobq_core::schema::SchemaViolation;
use serde_json::json;

/// Failure of a single job's logic.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// A stage's output did not match its expected shape.
    #[error("stage `{stage}` produced invalid output: {violation}")]
    Validation {
        stage: &'static str,
        violation: SchemaViolation,
    },

    /// Any other failure, tagged with the originating error's type name.
    #[error("{error_type}: {message}")]
    Execution { error_type: String, message: String },
}

impl JobError {
    /// Wrap an arbitrary error, keeping its type name for diagnosis.
    pub fn execution<E: std::error::Error>(err: &E) -> Self {
        JobError::Execution {
            error_type: short_type_name::<E>().to_string(),
            message: err.to_string(),
        }
    }

    /// The payload was missing or malformed for this job type.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        JobError::Execution {
            error_type: "InvalidPayload".to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::Validation { .. } => ErrorKind::ValidationError,
            JobError::Execution { .. } => ErrorKind::ExecutionError,
        }
    }

    /// Terminal failure metadata for `job`.
    ///
    /// The job's own id and type name are always carried in `details` so
    /// external observers can correlate the failure.
    pub fn into_failure(self, job: &ClaimedJob) -> JobFailure {
        let kind = self.kind();
        let message = self.to_string();
        let details = match self {
            JobError::Validation { stage, violation } => json!({
                "job_id": job.id.to_string(),
                "job_type": job.job_type,
                "stage": stage,
                "diagnostic": violation.to_string(),
            }),
            JobError::Execution { error_type, message } => json!({
                "job_id": job.id.to_string(),
                "job_type": job.job_type,
                "error_type": error_type,
                "message": message,
            }),
        };
        JobFailure {
            kind,
            message,
            details,
        }
    }
}

/// Last path segment of a type name (`jobq_pipeline::llm::LlmError` -> `LlmError`).
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ClaimedJob {
        ClaimedJob {
            id: uuid::Uuid::new_v4(),
            job_type: "summarize_checklist".into(),
            payload: json!({}),
        }
    }

    #[test]
    fn execution_captures_type_name() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let job_err = JobError::execution(&err);
        assert_matches::assert_matches!(
            &job_err,
            JobError::Execution { error_type, .. } if error_type == "Error"
        );
        assert_eq!(job_err.kind(), ErrorKind::ExecutionError);
    }

    #[test]
    fn validation_failure_keeps_job_identity() {
        let job = job();
        let failure = JobError::Validation {
            stage: "summary",
            violation: SchemaViolation::MissingField {
                path: "$".into(),
                field: "summary".into(),
            },
        }
        .into_failure(&job);

        assert_eq!(failure.kind, ErrorKind::ValidationError);
        assert_eq!(failure.details["job_id"], job.id.to_string());
        assert_eq!(failure.details["job_type"], "summarize_checklist");
        assert_eq!(failure.details["stage"], "summary");
        assert_eq!(
            failure.details["diagnostic"],
            "$: missing required field `summary`"
        );
        assert!(failure.message.contains("missing required field"));
    }

    #[test]
    fn invalid_payload_is_execution_error() {
        let failure = JobError::invalid_payload("`text` must be a string").into_failure(&job());
        assert_eq!(failure.kind, ErrorKind::ExecutionError);
        assert_eq!(failure.details["error_type"], "InvalidPayload");
        assert_eq!(failure.message, "InvalidPayload: `text` must be a string");
    }
}
