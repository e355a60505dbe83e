use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jobq_core::error::CoreError;
use jobq_core::result_store::StoreError;
use jobq_pipeline::dispatch::DispatchError;
use jobq_pipeline::status::TrackerError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent
/// `{ "error": ..., "code": ... }` JSON bodies. Backend failures are logged
/// and returned with a sanitized message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
            },

            // --- Submission ---
            AppError::Dispatch(DispatchError::UnknownJobType(name)) => (
                StatusCode::BAD_REQUEST,
                "UNKNOWN_JOB_TYPE",
                format!("Unknown job type: {name}"),
            ),
            AppError::Dispatch(err @ DispatchError::Enqueue(_)) => {
                tracing::error!(error = %err, "Job dispatch failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DISPATCH_ERROR",
                    "Failed to dispatch job".to_string(),
                )
            }

            // --- Status / results ---
            AppError::Tracker(err) => internal("Status lookup failed", err),
            AppError::Store(StoreError::NotFound(job_id)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("No result stored for job {job_id}"),
            ),
            AppError::Store(err) => internal("Result store failure", err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal(
    context: &'static str,
    err: &dyn std::fmt::Display,
) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "{context}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
