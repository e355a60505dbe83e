use axum::routing::get;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// POST   /    -> submit_job
/// GET    /    -> job_status (?jobId=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(jobs::job_status).post(jobs::submit_job))
}
