//! [`Broker`] backed by the `jobs` table.

use async_trait::async_trait;
use jobq_core::broker::{Broker, BrokerError};
use jobq_core::job_state::{ClaimedJob, JobOutcome, JobSnapshot};
use jobq_core::types::{JobId, Timestamp};

use crate::repositories::JobRepo;
use crate::DbPool;

/// Postgres-backed job queue.
#[derive(Clone)]
pub struct PgBroker {
    pool: DbPool,
}

impl PgBroker {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn unavailable(err: sqlx::Error) -> BrokerError {
    BrokerError::Unavailable(err.to_string())
}

#[async_trait]
impl Broker for PgBroker {
    async fn enqueue(
        &self,
        job_type: &str,
        payload: &serde_json::Value,
    ) -> Result<JobId, BrokerError> {
        let job = JobRepo::submit(&self.pool, job_type, payload)
            .await
            .map_err(unavailable)?;
        Ok(job.id)
    }

    async fn claim(&self, worker: &str) -> Result<Option<ClaimedJob>, BrokerError> {
        let job = JobRepo::claim_next(&self.pool, worker)
            .await
            .map_err(unavailable)?;
        Ok(job.map(|j| j.into_claimed()))
    }

    async fn report(&self, job_id: JobId, outcome: &JobOutcome) -> Result<(), BrokerError> {
        let updated = match outcome {
            JobOutcome::Succeeded(result) => JobRepo::complete(&self.pool, job_id, result).await,
            JobOutcome::Failed(failure) => {
                JobRepo::fail(
                    &self.pool,
                    job_id,
                    failure.kind.as_str(),
                    &failure.message,
                    &failure.details,
                )
                .await
            }
        }
        .map_err(unavailable)?;

        if !updated {
            return Err(BrokerError::NotRunning(job_id));
        }
        Ok(())
    }

    async fn lookup(&self, job_id: JobId) -> Result<Option<JobSnapshot>, BrokerError> {
        let job = JobRepo::find_by_id(&self.pool, job_id)
            .await
            .map_err(unavailable)?;
        Ok(job.and_then(|j| {
            let snapshot = j.to_snapshot();
            if snapshot.is_none() {
                tracing::warn!(job_id = %j.id, status_id = j.status_id, "Job row has unknown status id");
            }
            snapshot
        }))
    }

    async fn heartbeat(&self, job_id: JobId) -> Result<(), BrokerError> {
        let updated = JobRepo::heartbeat(&self.pool, job_id)
            .await
            .map_err(unavailable)?;
        if !updated {
            return Err(BrokerError::NotRunning(job_id));
        }
        Ok(())
    }

    async fn stale_running(&self, cutoff: Timestamp) -> Result<Vec<ClaimedJob>, BrokerError> {
        let jobs = JobRepo::find_stale_running(&self.pool, cutoff)
            .await
            .map_err(unavailable)?;
        Ok(jobs.into_iter().map(|j| j.into_claimed()).collect())
    }

    async fn purge_finished_before(&self, cutoff: Timestamp) -> Result<u64, BrokerError> {
        JobRepo::delete_finished_before(&self.pool, cutoff)
            .await
            .map_err(unavailable)
    }

    async fn health_check(&self) -> Result<(), BrokerError> {
        crate::health_check(&self.pool).await.map_err(unavailable)
    }
}
