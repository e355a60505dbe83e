use axum::routing::get;
use axum::Router;

use crate::handlers::results;
use crate::state::AppState;

/// Routes mounted at `/results`.
///
/// ```text
/// GET    /           -> list_results
/// GET    /{job_id}   -> get_result
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(results::list_results))
        .route("/{job_id}", get(results::get_result))
}
