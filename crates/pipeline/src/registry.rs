//! Static job-type registry.
//!
//! Populated once at process start and shared read-only. The dispatcher
//! consults it to reject unknown job types at submission time; workers use
//! it to find the handler for each claimed job.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jobq_core::types::JobId;

use crate::error::JobError;
use crate::handlers::{EchoJob, SleepJob, SummarizeChecklistJob};
use crate::llm::StructuredGenerator;

/// Executable logic for one job type.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Whether a successful run is written to the result store.
    ///
    /// Job types that return `false` expose their value only through the
    /// broker's own result channel.
    fn persists_result(&self) -> bool {
        false
    }

    /// Run the job to completion. Stages, if any, run sequentially.
    async fn run(
        &self,
        job_id: JobId,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, JobError>;
}

/// Mapping from job-type name to handler.
#[derive(Clone, Default)]
pub struct JobRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in job type.
    ///
    /// `generator` is the process-wide structured-generation client used by
    /// multi-stage jobs.
    pub fn standard(generator: Arc<dyn StructuredGenerator>) -> Self {
        Self::new()
            .with(EchoJob::NAME, EchoJob)
            .with(SleepJob::NAME, SleepJob)
            .with(
                SummarizeChecklistJob::NAME,
                SummarizeChecklistJob::new(generator),
            )
    }

    /// Register `handler` under `name`, replacing any previous entry.
    pub fn with(mut self, name: impl Into<String>, handler: impl JobHandler + 'static) -> Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// `false` for unknown names.
    pub fn persists_result(&self, name: &str) -> bool {
        self.handlers
            .get(name)
            .is_some_and(|handler| handler.persists_result())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
