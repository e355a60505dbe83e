//! Recovery of jobs whose worker disappeared mid-run.
//!
//! A job stays `RUNNING` only while its worker keeps the heartbeat fresh.
//! Once the heartbeat is older than the cutoff the job is closed: a result
//! already in the store means the handler finished and only the report was
//! lost, otherwise the job fails with `WorkerLost`.

use jobq_core::broker::{Broker, BrokerError};
use jobq_core::job_state::{ClaimedJob, JobOutcome};
use jobq_core::result_store::{ResultStore, StoreError};
use jobq_core::types::Timestamp;
use jobq_pipeline::error::JobError;

/// Close every running job whose heartbeat predates `cutoff`.
///
/// Returns how many jobs were closed.
pub async fn recover_stale_jobs(
    broker: &dyn Broker,
    results: &dyn ResultStore,
    cutoff: Timestamp,
) -> Result<u64, BrokerError> {
    let stale = broker.stale_running(cutoff).await?;
    let mut recovered = 0;

    for job in stale {
        let outcome = match results.get(job.id).await {
            Ok(stored) => JobOutcome::Succeeded(stored.result),
            Err(StoreError::NotFound(_)) => worker_lost(&job, cutoff),
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "Result lookup failed, skipping stale job");
                continue;
            }
        };

        match broker.report(job.id, &outcome).await {
            Ok(()) => {
                tracing::warn!(
                    job_id = %job.id,
                    job_type = %job.job_type,
                    succeeded = matches!(outcome, JobOutcome::Succeeded(_)),
                    "Recovered stale job",
                );
                recovered += 1;
            }
            // Reported by its worker in the meantime.
            Err(BrokerError::NotRunning(_)) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(recovered)
}

fn worker_lost(job: &ClaimedJob, cutoff: Timestamp) -> JobOutcome {
    let err = JobError::Execution {
        error_type: "WorkerLost".to_string(),
        message: format!("no heartbeat since before {}", cutoff.to_rfc3339()),
    };
    JobOutcome::Failed(err.into_failure(job))
}
