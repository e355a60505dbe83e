//! Task Dispatcher: validates the job type and enqueues the job.
//!
//! Dispatch never waits for execution. Both failure modes are reported
//! synchronously and nothing reaches the broker on an unknown job type.

use std::sync::Arc;

use jobq_core::broker::{Broker, BrokerError};
use jobq_core::types::JobId;

use crate::registry::JobRegistry;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown job type: {0}")]
    UnknownJobType(String),

    /// The broker could not accept the job.
    #[error("Failed to enqueue job: {0}")]
    Enqueue(#[from] BrokerError),
}

#[derive(Clone)]
pub struct TaskDispatcher {
    broker: Arc<dyn Broker>,
    registry: Arc<JobRegistry>,
}

impl TaskDispatcher {
    pub fn new(broker: Arc<dyn Broker>, registry: Arc<JobRegistry>) -> Self {
        Self { broker, registry }
    }

    /// Enqueue a job of `job_type` and return its identifier.
    ///
    /// `payload` is forwarded unmodified.
    pub async fn dispatch(
        &self,
        job_type: &str,
        payload: &serde_json::Value,
    ) -> Result<JobId, DispatchError> {
        if !self.registry.contains(job_type) {
            return Err(DispatchError::UnknownJobType(job_type.to_string()));
        }

        let job_id = self.broker.enqueue(job_type, payload).await?;
        tracing::info!(%job_id, job_type, "Job submitted");
        Ok(job_id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use assert_matches::assert_matches;
    use jobq_core::job_state::JobState;
    use jobq_core::memory::MemoryBroker;
    use serde_json::json;

    use super::*;
    use crate::handlers::EchoJob;

    fn dispatcher(broker: Arc<MemoryBroker>) -> TaskDispatcher {
        let registry = JobRegistry::new().with(EchoJob::NAME, EchoJob);
        TaskDispatcher::new(broker, Arc::new(registry))
    }

    #[tokio::test]
    async fn returns_unique_ids_and_enqueues_pending() {
        let broker = Arc::new(MemoryBroker::new());
        let dispatcher = dispatcher(broker.clone());

        let mut ids = HashSet::new();
        for _ in 0..5 {
            let id = dispatcher
                .dispatch("echo", &json!({ "message": "hi" }))
                .await
                .unwrap();
            assert!(!id.to_string().is_empty());
            ids.insert(id);
        }
        assert_eq!(ids.len(), 5);
        assert_eq!(broker.pending_count().await, 5);

        let any = *ids.iter().next().unwrap();
        let snapshot = broker.lookup(any).await.unwrap().unwrap();
        assert_eq!(snapshot.state, JobState::Pending);
    }

    #[tokio::test]
    async fn unknown_job_type_never_reaches_broker() {
        let broker = Arc::new(MemoryBroker::new());
        let dispatcher = dispatcher(broker.clone());

        let err = dispatcher
            .dispatch("api.tasks.hello_world", &json!({}))
            .await
            .unwrap_err();
        assert_matches!(err, DispatchError::UnknownJobType(ref name) if name == "api.tasks.hello_world");
        assert_eq!(broker.pending_count().await, 0);
    }

    #[tokio::test]
    async fn broker_outage_is_surfaced() {
        let broker = Arc::new(MemoryBroker::new());
        broker.set_offline(true);
        let dispatcher = dispatcher(broker);

        let err = dispatcher.dispatch("echo", &json!({})).await.unwrap_err();
        assert_matches!(err, DispatchError::Enqueue(BrokerError::Unavailable(_)));
    }
}
