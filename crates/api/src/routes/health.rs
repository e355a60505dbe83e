use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the broker is unreachable.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub broker_healthy: bool,
}

/// GET /health -- returns service and broker health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let broker_healthy = match state.broker.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Broker health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if broker_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        broker_healthy,
    })
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
