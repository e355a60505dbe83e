//! Handlers for the `/jobs` resource: submission and status polling.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use jobq_core::error::CoreError;
use jobq_pipeline::status::JobStatusView;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobRequest {
    pub job_type: Option<String>,
    /// Defaults to `{}` when absent or `null`.
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    pub job_id: String,
}

/// POST /api/v1/jobs
///
/// Enqueue a job and return `202 Accepted` with its id. Execution happens
/// later on a worker; poll the status endpoint for the outcome.
pub async fn submit_job(
    State(state): State<AppState>,
    body: Result<Json<SubmitJobRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let job_type = input
        .job_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Core(CoreError::Validation("jobType is required".into())))?;

    let payload = match input.payload {
        None | Some(serde_json::Value::Null) => serde_json::json!({}),
        Some(payload @ serde_json::Value::Object(_)) => payload,
        Some(_) => {
            return Err(AppError::Core(CoreError::Validation(
                "payload must be a JSON object".into(),
            )))
        }
    };

    let job_id = state.dispatcher.dispatch(job_type, &payload).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitJobResponse {
            job_id: job_id.to_string(),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusQuery {
    pub job_id: Option<String>,
}

/// GET /api/v1/jobs?jobId=
///
/// Unknown ids are not an error: they report `UNKNOWN` with a null result.
pub async fn job_status(
    State(state): State<AppState>,
    query: Result<Query<JobStatusQuery>, QueryRejection>,
) -> AppResult<Json<JobStatusView>> {
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let job_id = query
        .job_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("jobId query parameter is required".into()))?;

    let view = state.tracker.status(job_id).await?;
    Ok(Json(view))
}
