//! Read-only access to persisted job results.

use axum::extract::{Path, Query, State};
use axum::Json;
use jobq_core::error::CoreError;
use jobq_core::result_store::{ResultQuery, StoreError, TaskResult};
use jobq_core::types::parse_job_id;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultListParams {
    pub job_type_name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/results
///
/// Newest first; `limit` defaults to 50 and is capped at 100.
pub async fn list_results(
    State(state): State<AppState>,
    Query(params): Query<ResultListParams>,
) -> AppResult<Json<DataResponse<Vec<TaskResult>>>> {
    let query = ResultQuery {
        job_type_name: params.job_type_name.filter(|n| !n.is_empty()),
        limit: params.limit,
        offset: params.offset,
    };
    let data = state.results.list(&query).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/results/{job_id}
pub async fn get_result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<DataResponse<TaskResult>>> {
    let id = parse_job_id(&job_id)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid job id: {job_id}")))?;

    let data = state.results.get(id).await.map_err(|e| match e {
        StoreError::NotFound(_) => AppError::Core(CoreError::NotFound {
            entity: "TaskResult",
            id: job_id.clone(),
        }),
        other => other.into(),
    })?;
    Ok(Json(DataResponse { data }))
}
