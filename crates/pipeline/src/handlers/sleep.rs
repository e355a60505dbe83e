use std::time::Duration;

use async_trait::async_trait;
use jobq_core::types::JobId;

use super::text_field;
use crate::error::JobError;
use crate::registry::JobHandler;

/// Waits for `duration` seconds, then reports what it did.
///
/// Payload: `{ "duration": number?, "message": string? }`. Any duration
/// representable as a [`Duration`] is accepted.
pub struct SleepJob;

impl SleepJob {
    pub const NAME: &'static str = "sleep";
}

/// Parse the `duration` field in seconds. Missing means zero.
fn duration_secs(payload: &serde_json::Value) -> Result<f64, JobError> {
    match payload.get("duration") {
        None | Some(serde_json::Value::Null) => Ok(0.0),
        Some(value) => value
            .as_f64()
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .ok_or_else(|| {
                JobError::invalid_payload(format!(
                    "`duration` must be a non-negative number of seconds, got {value}"
                ))
            }),
    }
}

/// Whole numbers print without a fractional part.
fn format_secs(secs: f64) -> String {
    if secs.fract() == 0.0 && secs < u64::MAX as f64 {
        format!("{}", secs as u64)
    } else {
        format!("{secs}")
    }
}

#[async_trait]
impl JobHandler for SleepJob {
    async fn run(
        &self,
        job_id: JobId,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, JobError> {
        let secs = duration_secs(payload)?;
        let wait = Duration::try_from_secs_f64(secs).map_err(|_| {
            JobError::invalid_payload(format!("`duration` of {secs} seconds is too large"))
        })?;
        let message = text_field(payload, "message");

        tracing::debug!(%job_id, secs, "Sleep job waiting");
        tokio::time::sleep(wait).await;

        Ok(serde_json::Value::String(format!(
            "Slept for {} seconds. Message: {message}",
            format_secs(secs)
        )))
    }
}
