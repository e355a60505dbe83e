//! Job life-cycle states and terminal outcomes.
//!
//! [`JobState`] is the engine's internal view (`PENDING -> RUNNING ->
//! SUCCEEDED | FAILED`). [`ReportedStatus`] is the vocabulary exposed to
//! callers polling the status endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// JobState
// ---------------------------------------------------------------------------

/// Execution state of a dispatched job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Queued, not yet claimed by a worker.
    Pending,
    /// Claimed by exactly one worker.
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    /// `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Transitions are monotonic: nothing re-enters `Pending`, and terminal
    /// states are final.
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Pending, JobState::Running)
                | (JobState::Running, JobState::Succeeded)
                | (JobState::Running, JobState::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "PENDING",
            JobState::Running => "RUNNING",
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReportedStatus
// ---------------------------------------------------------------------------

/// Status string returned to pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportedStatus {
    Pending,
    Started,
    Success,
    Failure,
    /// The identifier is not known to the broker.
    Unknown,
}

impl ReportedStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ReportedStatus::Success | ReportedStatus::Failure)
    }
}

impl From<JobState> for ReportedStatus {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Pending => ReportedStatus::Pending,
            JobState::Running => ReportedStatus::Started,
            JobState::Succeeded => ReportedStatus::Success,
            JobState::Failed => ReportedStatus::Failure,
        }
    }
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// Classification recorded on a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A stage's output did not match its expected shape.
    ValidationError,
    /// Any other runtime failure, including external-service errors.
    ExecutionError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::ExecutionError => "ExecutionError",
        }
    }

    /// Parse the stored column value back into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ValidationError" => Some(ErrorKind::ValidationError),
            "ExecutionError" => Some(ErrorKind::ExecutionError),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure metadata attached to a `FAILED` job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
    /// Structured diagnostic (job id, job type, stage, error type name, ...).
    pub details: serde_json::Value,
}

impl JobFailure {
    /// Text form handed to pollers as the job's `result`.
    pub fn describe(&self) -> String {
        format!("{}: {}", self.kind, self.message)
    }
}

/// How a job ended, as reported by a worker to the broker.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded(serde_json::Value),
    Failed(JobFailure),
}

impl JobOutcome {
    pub fn state(&self) -> JobState {
        match self {
            JobOutcome::Succeeded(_) => JobState::Succeeded,
            JobOutcome::Failed(_) => JobState::Failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Broker views
// ---------------------------------------------------------------------------

/// A job handed to a worker by [`Broker::claim`](crate::broker::Broker::claim).
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedJob {
    pub id: JobId,
    pub job_type: String,
    pub payload: serde_json::Value,
}

/// The broker's latest knowledge about a job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub id: JobId,
    pub job_type: String,
    pub state: JobState,
    /// Value returned through the broker's own result channel.
    pub result: Option<serde_json::Value>,
    pub failure: Option<JobFailure>,
    pub submitted_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}
