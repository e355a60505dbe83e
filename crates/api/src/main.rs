use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use jobq_api::background::{job_retention, stale_jobs};
use jobq_api::config::ServerConfig;
use jobq_api::router::build_app_router;
use jobq_api::state::AppState;
use jobq_core::broker::Broker;
use jobq_core::result_store::ResultStore;
use jobq_db::{PgBroker, PgResultStore};
use jobq_pipeline::llm::{LlmConfig, OpenAiGenerator};
use jobq_pipeline::registry::JobRegistry;
use jobq_worker::config::WorkerConfig;
use jobq_worker::{shutdown, telemetry, WorkerDeps, WorkerPool};
use tokio_util::sync::CancellationToken;

/// How long embedded workers may finish in-flight jobs after shutdown starts.
const WORKER_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    telemetry::init("jobq_api=debug,jobq_worker=debug,jobq_pipeline=debug,tower_http=debug");

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = jobq_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    jobq_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    jobq_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Broker, result store, job registry ---
    let broker: Arc<dyn Broker> = Arc::new(PgBroker::new(pool.clone()));
    let results: Arc<dyn ResultStore> = Arc::new(PgResultStore::new(pool.clone()));

    let generator = OpenAiGenerator::new(LlmConfig::from_env());
    let registry = Arc::new(JobRegistry::standard(Arc::new(generator)));
    tracing::info!(job_types = ?registry.names(), "Job registry loaded");

    // --- Embedded workers ---
    let workers = (config.embedded_workers > 0).then(|| {
        let worker_config = WorkerConfig {
            concurrency: config.embedded_workers,
            ..WorkerConfig::from_env()
        };
        WorkerPool::start(
            WorkerDeps {
                broker: broker.clone(),
                results: results.clone(),
                registry: registry.clone(),
            },
            &worker_config,
        )
    });

    // --- Background tasks ---
    let background_cancel = CancellationToken::new();
    let retention_handle = tokio::spawn(job_retention::run(
        broker.clone(),
        config.job_retention_hours,
        background_cancel.clone(),
    ));
    let recovery_handle = tokio::spawn(stale_jobs::run(
        broker.clone(),
        results.clone(),
        config.stale_job_secs,
        background_cancel.clone(),
    ));

    // --- Router ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    let state = AppState::new(broker, results, registry, config);
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    background_cancel.cancel();
    for (task, handle) in [
        ("job retention", retention_handle),
        ("stale job recovery", recovery_handle),
    ] {
        match tokio::time::timeout(Duration::from_secs(5), handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(task, error = %e, "Background task ended abnormally"),
            Err(_) => tracing::warn!(task, "Background task did not stop in time"),
        }
    }

    if let Some(workers) = workers {
        workers.shutdown(WORKER_SHUTDOWN_GRACE).await;
    }

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}
