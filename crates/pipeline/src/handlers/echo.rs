use async_trait::async_trait;
use jobq_core::types::JobId;

use super::text_field;
use crate::error::JobError;
use crate::registry::JobHandler;

/// Greets with the payload's `message`.
///
/// Payload: `{ "message": string? }`. Returns `"hello world <message>"`.
pub struct EchoJob;

impl EchoJob {
    pub const NAME: &'static str = "echo";
}

#[async_trait]
impl JobHandler for EchoJob {
    async fn run(
        &self,
        job_id: JobId,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, JobError> {
        let message = text_field(payload, "message");
        tracing::debug!(%job_id, "Echo job running");
        Ok(serde_json::Value::String(format!("hello world {message}")))
    }
}
