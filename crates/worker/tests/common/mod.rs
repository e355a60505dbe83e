use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobq_core::memory::{MemoryBroker, MemoryResultStore};
use jobq_pipeline::dispatch::TaskDispatcher;
use jobq_pipeline::llm::{LlmError, StructuredGenerator};
use jobq_pipeline::registry::JobRegistry;
use jobq_pipeline::status::{JobStatusView, StatusTracker};
use jobq_worker::config::WorkerConfig;
use jobq_worker::{WorkerDeps, WorkerPool};
use tokio::sync::Mutex;

/// Generator that replays canned replies in order.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        })
    }
}

#[async_trait]
impl StructuredGenerator for ScriptedGenerator {
    async fn generate(&self, _instructions: &str, _prompt: &str) -> Result<String, LlmError> {
        self.replies
            .lock()
            .await
            .pop_front()
            .ok_or(LlmError::EmptyResponse)
    }
}

/// Dispatcher, tracker and a running worker pool over in-memory backends.
pub struct Harness {
    pub broker: Arc<MemoryBroker>,
    pub results: Arc<MemoryResultStore>,
    pub dispatcher: TaskDispatcher,
    pub tracker: StatusTracker,
    pub workers: WorkerPool,
}

impl Harness {
    pub fn start(registry: JobRegistry) -> Self {
        let broker = Arc::new(MemoryBroker::new());
        let results = Arc::new(MemoryResultStore::new());
        let registry = Arc::new(registry);

        let dispatcher = TaskDispatcher::new(broker.clone(), registry.clone());
        let tracker = StatusTracker::new(broker.clone(), results.clone(), registry.clone());
        let workers = WorkerPool::start(
            WorkerDeps {
                broker: broker.clone(),
                results: results.clone(),
                registry,
            },
            &WorkerConfig {
                concurrency: 2,
                poll_interval: Duration::from_millis(20),
                name: "it".into(),
            },
        );

        Self {
            broker,
            results,
            dispatcher,
            tracker,
            workers,
        }
    }

    /// Poll until the job reaches a terminal status or `timeout` elapses.
    pub async fn wait_terminal(&self, job_id: &str, timeout: Duration) -> JobStatusView {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let view = self.tracker.status(job_id).await.unwrap();
            if view.status.is_terminal() {
                return view;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "job {job_id} still {:?} after {timeout:?}",
                view.status
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    pub async fn stop(self) {
        self.workers.shutdown(Duration::from_secs(5)).await;
    }
}
