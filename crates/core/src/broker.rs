//! Broker abstraction: the queue mediating dispatch and claim of jobs.
//!
//! The broker owns job identity and state. It guarantees at most one active
//! claim per job, and only accepts monotonic state transitions.

use async_trait::async_trait;

use crate::job_state::{ClaimedJob, JobOutcome, JobSnapshot};
use crate::types::{JobId, Timestamp};

/// Errors surfaced by a broker implementation.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// The broker could not be reached or the operation failed at the
    /// storage level.
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    /// A terminal outcome was reported for a job that is not `RUNNING`.
    #[error("Job {0} is not running")]
    NotRunning(JobId),
}

#[async_trait]
pub trait Broker: Send + Sync {
    /// Enqueue a new `PENDING` job and return its identifier.
    async fn enqueue(
        &self,
        job_type: &str,
        payload: &serde_json::Value,
    ) -> Result<JobId, BrokerError>;

    /// Atomically claim the oldest `PENDING` job, moving it to `RUNNING`.
    ///
    /// Returns `None` when the queue is empty.
    async fn claim(&self, worker: &str) -> Result<Option<ClaimedJob>, BrokerError>;

    /// Record a terminal outcome for a `RUNNING` job.
    async fn report(&self, job_id: JobId, outcome: &JobOutcome) -> Result<(), BrokerError>;

    /// Latest known state of a job, or `None` if the id is unknown.
    async fn lookup(&self, job_id: JobId) -> Result<Option<JobSnapshot>, BrokerError>;

    /// Mark a `RUNNING` job as still held by a live worker.
    async fn heartbeat(&self, job_id: JobId) -> Result<(), BrokerError>;

    /// `RUNNING` jobs whose last heartbeat (or claim) is older than `cutoff`.
    async fn stale_running(&self, cutoff: Timestamp) -> Result<Vec<ClaimedJob>, BrokerError>;

    /// Drop terminal jobs completed before `cutoff`. Returns the number purged.
    async fn purge_finished_before(&self, cutoff: Timestamp) -> Result<u64, BrokerError>;

    async fn health_check(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}
