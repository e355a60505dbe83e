pub mod health;
pub mod jobs;
pub mod results;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /jobs                 submit (POST), status by ?jobId= (GET)
/// /results              list stored results (GET)
/// /results/{jobId}      stored result for one job (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/results", results::router())
}
