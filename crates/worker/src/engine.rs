//! Single worker: claim, execute, persist, report.
//!
//! Every claimed job ends in exactly one terminal report. Handler errors and
//! panics become a `FAILED` outcome carrying the job's identity; they never
//! take the worker loop down with them.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use jobq_core::broker::{Broker, BrokerError};
use jobq_core::job_state::{ClaimedJob, JobOutcome};
use jobq_core::result_store::{ResultStore, StoreError};
use jobq_pipeline::error::JobError;
use jobq_pipeline::registry::JobRegistry;
use tokio_util::sync::CancellationToken;

/// How often a running job's heartbeat is refreshed.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

const REPORT_BACKOFF_START: Duration = Duration::from_millis(100);
const REPORT_BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Shared services every worker needs.
#[derive(Clone)]
pub struct WorkerDeps {
    pub broker: Arc<dyn Broker>,
    pub results: Arc<dyn ResultStore>,
    pub registry: Arc<JobRegistry>,
}

pub struct Worker {
    name: String,
    deps: WorkerDeps,
}

impl Worker {
    pub fn new(name: impl Into<String>, deps: WorkerDeps) -> Self {
        Self {
            name: name.into(),
            deps,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `job` to its terminal outcome without reporting it.
    ///
    /// Successful results of persisting job types are written to the result
    /// store first; a storage failure turns the outcome into an
    /// `ExecutionError`.
    pub async fn execute(&self, job: &ClaimedJob) -> JobOutcome {
        let Some(handler) = self.deps.registry.get(&job.job_type) else {
            let err = JobError::Execution {
                error_type: "UnknownJobType".to_string(),
                message: format!("no handler registered for `{}`", job.job_type),
            };
            return self.failed(job, err);
        };

        let run = AssertUnwindSafe(handler.run(job.id, &job.payload)).catch_unwind();
        let value = match run.await {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => return self.failed(job, err),
            Err(panic) => {
                let err = JobError::Execution {
                    error_type: "panic".to_string(),
                    message: panic_message(panic.as_ref()),
                };
                return self.failed(job, err);
            }
        };

        if handler.persists_result() {
            match self.deps.results.save(job.id, &job.job_type, &value).await {
                Ok(record) => {
                    tracing::debug!(job_id = %job.id, result_id = %record.id, "Result stored");
                }
                Err(StoreError::DuplicateResult(_)) => {
                    // The first stored record stays authoritative.
                    tracing::error!(
                        job_id = %job.id,
                        job_type = %job.job_type,
                        "Result already stored for job, keeping existing record",
                    );
                }
                Err(e) => return self.failed(job, JobError::execution(&e)),
            }
        }

        JobOutcome::Succeeded(value)
    }

    /// Claim and process at most one job.
    ///
    /// The job's heartbeat is refreshed while the handler runs. The outcome
    /// report is retried until the broker accepts it or `cancel` fires.
    /// Returns `Ok(false)` when the queue was empty.
    pub async fn run_once(&self, cancel: &CancellationToken) -> Result<bool, BrokerError> {
        let Some(job) = self.deps.broker.claim(&self.name).await? else {
            return Ok(false);
        };

        tracing::info!(
            worker = %self.name,
            job_id = %job.id,
            job_type = %job.job_type,
            "Job started",
        );
        let started = Instant::now();

        let outcome = self.execute_with_heartbeat(&job).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if let JobOutcome::Succeeded(_) = &outcome {
            tracing::info!(job_id = %job.id, elapsed_ms, "Job succeeded");
        }

        self.report_with_retry(&job, &outcome, cancel).await;
        Ok(true)
    }

    async fn execute_with_heartbeat(&self, job: &ClaimedJob) -> JobOutcome {
        let exec = self.execute(job);
        tokio::pin!(exec);
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + HEARTBEAT_INTERVAL,
            HEARTBEAT_INTERVAL,
        );

        loop {
            tokio::select! {
                outcome = &mut exec => return outcome,
                _ = ticker.tick() => {
                    if let Err(e) = self.deps.broker.heartbeat(job.id).await {
                        tracing::warn!(
                            worker = %self.name,
                            job_id = %job.id,
                            error = %e,
                            "Heartbeat failed",
                        );
                    }
                }
            }
        }
    }

    async fn report_with_retry(
        &self,
        job: &ClaimedJob,
        outcome: &JobOutcome,
        cancel: &CancellationToken,
    ) {
        let mut backoff = REPORT_BACKOFF_START;
        let mut attempt: u32 = 1;

        loop {
            match self.deps.broker.report(job.id, outcome).await {
                Ok(()) => return,
                Err(e @ BrokerError::NotRunning(_)) => {
                    tracing::error!(
                        worker = %self.name,
                        job_id = %job.id,
                        error = %e,
                        "Outcome rejected, job is no longer running",
                    );
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        worker = %self.name,
                        job_id = %job.id,
                        attempt,
                        retry_in_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Failed to report job outcome",
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::error!(
                        worker = %self.name,
                        job_id = %job.id,
                        attempt,
                        "Gave up reporting job outcome on shutdown",
                    );
                    return;
                }
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(REPORT_BACKOFF_MAX);
            attempt += 1;
        }
    }

    /// Process jobs until `cancel` fires.
    ///
    /// A job already running when cancellation arrives is finished and
    /// reported before the loop exits.
    pub async fn run(&self, cancel: CancellationToken, poll_interval: Duration) {
        tracing::info!(
            worker = %self.name,
            poll_interval_ms = poll_interval.as_millis() as u64,
            "Worker started",
        );

        while !cancel.is_cancelled() {
            let idle = match self.run_once(&cancel).await {
                Ok(processed) => !processed,
                Err(e) => {
                    tracing::error!(worker = %self.name, error = %e, "Claim failed");
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
        }

        tracing::info!(worker = %self.name, "Worker shutting down");
    }

    fn failed(&self, job: &ClaimedJob, err: JobError) -> JobOutcome {
        let failure = err.into_failure(job);
        tracing::warn!(
            worker = %self.name,
            job_id = %job.id,
            job_type = %job.job_type,
            kind = %failure.kind,
            error = %failure.message,
            "Job failed",
        );
        JobOutcome::Failed(failure)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use jobq_core::job_state::{ErrorKind, JobState};
    use jobq_core::memory::{MemoryBroker, MemoryResultStore};
    use jobq_pipeline::handlers::EchoJob;
    use jobq_pipeline::registry::JobHandler;
    use serde_json::json;

    use super::*;

    fn worker(broker: Arc<MemoryBroker>, results: Arc<MemoryResultStore>) -> Worker {
        let registry = JobRegistry::new().with(EchoJob::NAME, EchoJob);
        Worker::new(
            "test-worker",
            WorkerDeps {
                broker,
                results,
                registry: Arc::new(registry),
            },
        )
    }

    #[tokio::test]
    async fn run_once_on_empty_queue_is_idle() {
        let w = worker(
            Arc::new(MemoryBroker::new()),
            Arc::new(MemoryResultStore::new()),
        );
        assert!(!w.run_once(&CancellationToken::new()).await.unwrap());
    }

    #[tokio::test]
    async fn run_once_reports_success() {
        let broker = Arc::new(MemoryBroker::new());
        let w = worker(broker.clone(), Arc::new(MemoryResultStore::new()));
        let id = broker
            .enqueue("echo", &json!({ "message": "hi" }))
            .await
            .unwrap();

        assert!(w.run_once(&CancellationToken::new()).await.unwrap());
        let snapshot = broker.lookup(id).await.unwrap().unwrap();
        assert_eq!(snapshot.state, JobState::Succeeded);
        assert_eq!(snapshot.result, Some(json!("hello world hi")));
    }

    #[tokio::test]
    async fn unregistered_job_type_fails() {
        let w = worker(
            Arc::new(MemoryBroker::new()),
            Arc::new(MemoryResultStore::new()),
        );
        let job = ClaimedJob {
            id: uuid::Uuid::new_v4(),
            job_type: "retired".into(),
            payload: json!({}),
        };

        let outcome = w.execute(&job).await;
        assert_matches!(
            outcome,
            JobOutcome::Failed(ref f)
                if f.kind == ErrorKind::ExecutionError && f.details["error_type"] == "UnknownJobType"
        );
    }

    #[tokio::test]
    async fn claim_errors_surface_from_run_once() {
        let broker = Arc::new(MemoryBroker::new());
        broker.set_offline(true);
        let w = worker(broker, Arc::new(MemoryResultStore::new()));
        assert_matches!(
            w.run_once(&CancellationToken::new()).await,
            Err(BrokerError::Unavailable(_))
        );
    }

    /// Takes the broker offline once the handler has produced its value, so
    /// the result is saved while the report still has to be retried.
    struct OutageJob {
        broker: Arc<MemoryBroker>,
    }

    #[async_trait::async_trait]
    impl JobHandler for OutageJob {
        fn persists_result(&self) -> bool {
            true
        }

        async fn run(
            &self,
            _job_id: jobq_core::types::JobId,
            _payload: &serde_json::Value,
        ) -> Result<serde_json::Value, JobError> {
            self.broker.set_offline(true);
            let broker = self.broker.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(250)).await;
                broker.set_offline(false);
            });
            Ok(json!({ "summary": "done" }))
        }
    }

    #[tokio::test]
    async fn report_is_retried_until_broker_returns() {
        let broker = Arc::new(MemoryBroker::new());
        let results = Arc::new(MemoryResultStore::new());
        let registry = JobRegistry::new().with(
            "outage",
            OutageJob {
                broker: broker.clone(),
            },
        );
        let w = Worker::new(
            "test-worker",
            WorkerDeps {
                broker: broker.clone(),
                results: results.clone(),
                registry: Arc::new(registry),
            },
        );
        let id = broker.enqueue("outage", &json!({})).await.unwrap();

        let processed = tokio::time::timeout(
            Duration::from_secs(5),
            w.run_once(&CancellationToken::new()),
        )
        .await
        .unwrap();
        assert!(processed.unwrap());

        let snapshot = broker.lookup(id).await.unwrap().unwrap();
        assert_eq!(snapshot.state, JobState::Succeeded);
        assert_eq!(snapshot.result, Some(json!({ "summary": "done" })));
        assert_eq!(
            results.get(id).await.unwrap().result,
            json!({ "summary": "done" })
        );
    }

    #[tokio::test]
    async fn report_retry_stops_on_cancel() {
        let broker = Arc::new(MemoryBroker::new());
        let w = worker(broker.clone(), Arc::new(MemoryResultStore::new()));
        let job = ClaimedJob {
            id: uuid::Uuid::new_v4(),
            job_type: "echo".into(),
            payload: json!({}),
        };
        broker.set_offline(true);
        let cancel = CancellationToken::new();
        cancel.cancel();

        tokio::time::timeout(
            Duration::from_secs(1),
            w.report_with_retry(&job, &JobOutcome::Succeeded(json!(null)), &cancel),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let w = worker(
            Arc::new(MemoryBroker::new()),
            Arc::new(MemoryResultStore::new()),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        tokio::time::timeout(
            Duration::from_secs(1),
            w.run(cancel, Duration::from_millis(10)),
        )
        .await
        .unwrap();
    }

    #[test]
    fn panic_message_extracts_text() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "handler panicked");
    }
}
