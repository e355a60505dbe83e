//! `jobq-worker`: standalone worker process.
//!
//! Claims jobs from the Postgres-backed broker until SIGINT/SIGTERM, then
//! finishes in-flight jobs and exits.
//!
//! # Environment variables
//!
//! | Variable       | Required | Description                              |
//! |----------------|----------|------------------------------------------|
//! | `DATABASE_URL` | yes      | Postgres connection string               |
//! | `WORKER_*`     | no       | See [`WorkerConfig::from_env`]           |
//! | `LLM_*`        | no       | See `LlmConfig::from_env`                |
//! | `LOG_FORMAT`   | no       | `json` for one JSON object per line      |

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use jobq_db::{PgBroker, PgResultStore};
use jobq_pipeline::llm::{LlmConfig, OpenAiGenerator};
use jobq_pipeline::registry::JobRegistry;
use jobq_worker::config::WorkerConfig;
use jobq_worker::{shutdown, telemetry, WorkerDeps, WorkerPool};

/// How long in-flight jobs may run after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("jobq_worker=debug,jobq_pipeline=debug,jobq_db=debug");

    let config = WorkerConfig::from_env();
    tracing::info!(
        name = %config.name,
        concurrency = config.concurrency,
        "Loaded worker configuration",
    );

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = jobq_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    jobq_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    let generator = OpenAiGenerator::new(LlmConfig::from_env());
    if !generator.is_configured() {
        tracing::warn!("LLM_API_KEY not set, summarize_checklist jobs will fail");
    }
    let registry = JobRegistry::standard(Arc::new(generator));
    tracing::info!(job_types = ?registry.names(), "Job registry loaded");

    let deps = WorkerDeps {
        broker: Arc::new(PgBroker::new(pool.clone())),
        results: Arc::new(PgResultStore::new(pool.clone())),
        registry: Arc::new(registry),
    };
    let workers = WorkerPool::start(deps, &config);

    shutdown::shutdown_signal().await;
    workers.shutdown(SHUTDOWN_GRACE).await;
    pool.close().await;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}
