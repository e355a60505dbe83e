//! Status Tracker: reports a job's latest state and, once it succeeded, its
//! result.
//!
//! Job types that persist their output are resolved through the result
//! store; the rest use the value the worker reported to the broker. Failed
//! jobs report their error as text, never as a structured error object.

use std::sync::Arc;

use jobq_core::broker::{Broker, BrokerError};
use jobq_core::job_state::{JobSnapshot, JobState, ReportedStatus};
use jobq_core::result_store::{ResultStore, StoreError};
use jobq_core::types::parse_job_id;
use serde::Serialize;

use crate::registry::JobRegistry;

/// Status payload returned to pollers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub job_id: String,
    pub status: ReportedStatus,
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct StatusTracker {
    broker: Arc<dyn Broker>,
    results: Arc<dyn ResultStore>,
    registry: Arc<JobRegistry>,
}

impl StatusTracker {
    pub fn new(
        broker: Arc<dyn Broker>,
        results: Arc<dyn ResultStore>,
        registry: Arc<JobRegistry>,
    ) -> Self {
        Self {
            broker,
            results,
            registry,
        }
    }

    /// Look up `job_id`. Identifiers the broker does not know (including
    /// malformed ones) report [`ReportedStatus::Unknown`].
    pub async fn status(&self, job_id: &str) -> Result<JobStatusView, TrackerError> {
        let unknown = JobStatusView {
            job_id: job_id.to_string(),
            status: ReportedStatus::Unknown,
            result: None,
        };

        let Some(id) = parse_job_id(job_id) else {
            return Ok(unknown);
        };
        let Some(snapshot) = self.broker.lookup(id).await? else {
            return Ok(unknown);
        };

        let result = match snapshot.state {
            JobState::Pending | JobState::Running => None,
            JobState::Failed => Some(failure_text(&snapshot)),
            JobState::Succeeded => self.success_value(&snapshot).await?,
        };

        Ok(JobStatusView {
            job_id: job_id.to_string(),
            status: snapshot.state.into(),
            result,
        })
    }

    async fn success_value(
        &self,
        snapshot: &JobSnapshot,
    ) -> Result<Option<serde_json::Value>, TrackerError> {
        if !self.registry.persists_result(&snapshot.job_type) {
            return Ok(snapshot.result.clone());
        }
        match self.results.get(snapshot.id).await {
            Ok(record) => Ok(Some(record.result)),
            Err(StoreError::NotFound(_)) => {
                tracing::warn!(
                    job_id = %snapshot.id,
                    job_type = %snapshot.job_type,
                    "Succeeded job has no stored result, using broker value",
                );
                Ok(snapshot.result.clone())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn failure_text(snapshot: &JobSnapshot) -> serde_json::Value {
    let text = snapshot
        .failure
        .as_ref()
        .map(|f| f.describe())
        .unwrap_or_else(|| "ExecutionError: job failed".to_string());
    serde_json::Value::String(text)
}
