//! A fixed set of concurrent [`Worker`] loops sharing one cancellation token.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;
use crate::engine::{Worker, WorkerDeps};

pub struct WorkerPool {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `config.concurrency` workers named `<name>-<n>`.
    pub fn start(deps: WorkerDeps, config: &WorkerConfig) -> Self {
        let cancel = CancellationToken::new();
        let handles = (1..=config.concurrency)
            .map(|n| {
                let worker = Worker::new(format!("{}-{n}", config.name), deps.clone());
                let cancel = cancel.clone();
                let poll_interval = config.poll_interval;
                tokio::spawn(async move { worker.run(cancel, poll_interval).await })
            })
            .collect::<Vec<_>>();

        tracing::info!(
            workers = handles.len(),
            name = %config.name,
            "Worker pool started",
        );
        Self { cancel, handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Stop claiming new jobs and wait up to `grace` for in-flight jobs.
    ///
    /// Workers still busy after `grace` are aborted; their jobs remain
    /// `RUNNING` in the broker.
    pub async fn shutdown(self, grace: Duration) {
        self.cancel.cancel();
        let deadline = tokio::time::Instant::now() + grace;

        for mut handle in self.handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "Worker task ended abnormally"),
                Err(_) => {
                    tracing::warn!("Worker did not stop within grace period, aborting");
                    handle.abort();
                }
            }
        }
        tracing::info!("Worker pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jobq_core::broker::Broker;
    use jobq_core::job_state::JobState;
    use jobq_core::memory::{MemoryBroker, MemoryResultStore};
    use jobq_pipeline::handlers::EchoJob;
    use jobq_pipeline::registry::JobRegistry;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn pool_drains_queue_and_stops() {
        let broker = Arc::new(MemoryBroker::new());
        let deps = WorkerDeps {
            broker: broker.clone(),
            results: Arc::new(MemoryResultStore::new()),
            registry: Arc::new(JobRegistry::new().with(EchoJob::NAME, EchoJob)),
        };
        let config = WorkerConfig {
            concurrency: 3,
            poll_interval: Duration::from_millis(10),
            name: "pool-test".into(),
        };

        let mut ids = Vec::new();
        for n in 0..10 {
            ids.push(
                broker
                    .enqueue("echo", &json!({ "message": n.to_string() }))
                    .await
                    .unwrap(),
            );
        }

        let pool = WorkerPool::start(deps, &config);
        assert_eq!(pool.size(), 3);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let mut done = 0;
            for id in &ids {
                if broker.lookup(*id).await.unwrap().unwrap().state == JobState::Succeeded {
                    done += 1;
                }
            }
            if done == ids.len() {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "queue not drained");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        pool.shutdown(Duration::from_secs(1)).await;
    }
}
