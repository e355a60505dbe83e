#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use jobq_api::config::ServerConfig;
use jobq_api::router::build_app_router;
use jobq_api::state::AppState;
use jobq_core::memory::{MemoryBroker, MemoryResultStore};
use jobq_pipeline::handlers::{EchoJob, SleepJob};
use jobq_pipeline::registry::JobRegistry;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        embedded_workers: 0,
        job_retention_hours: 168,
        stale_job_secs: 300,
    }
}

/// App wired to in-memory backends. No workers run, so submitted jobs stay
/// `PENDING` unless a test drives them through the broker directly.
pub struct TestApp {
    pub router: Router,
    pub broker: Arc<MemoryBroker>,
    pub results: Arc<MemoryResultStore>,
}

pub fn build_test_app() -> TestApp {
    let broker = Arc::new(MemoryBroker::new());
    let results = Arc::new(MemoryResultStore::new());
    let registry = JobRegistry::new()
        .with(EchoJob::NAME, EchoJob)
        .with(SleepJob::NAME, SleepJob);

    let state = AppState::new(
        broker.clone(),
        results.clone(),
        Arc::new(registry),
        test_config(),
    );

    TestApp {
        router: build_app_router(state),
        broker,
        results,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
