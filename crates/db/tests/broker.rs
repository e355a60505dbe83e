//! Integration tests for the Postgres-backed broker queue.
//!
//! Need a reachable Postgres (`DATABASE_URL`); run with `--ignored`.

use assert_matches::assert_matches;
use jobq_core::broker::{Broker, BrokerError};
use jobq_core::job_state::{ErrorKind, JobFailure, JobOutcome, JobState};
use jobq_db::PgBroker;
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Test: bootstrap seeds every job status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn migrations_seed_job_statuses(pool: PgPool) {
    jobq_db::health_check(&pool).await.unwrap();

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM job_statuses")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 4);
}

// ---------------------------------------------------------------------------
// Test: full life-cycle pending -> running -> succeeded
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn job_moves_through_lifecycle(pool: PgPool) {
    let broker = PgBroker::new(pool);

    let id = broker
        .enqueue("echo", &json!({ "message": "hi" }))
        .await
        .unwrap();
    assert_eq!(
        broker.lookup(id).await.unwrap().unwrap().state,
        JobState::Pending
    );

    let claimed = broker.claim("worker-1").await.unwrap().unwrap();
    assert_eq!(claimed.id, id);
    assert_eq!(claimed.payload["message"], "hi");
    assert_eq!(
        broker.lookup(id).await.unwrap().unwrap().state,
        JobState::Running
    );

    broker
        .report(id, &JobOutcome::Succeeded(json!("hello world hi")))
        .await
        .unwrap();

    let snapshot = broker.lookup(id).await.unwrap().unwrap();
    assert_eq!(snapshot.state, JobState::Succeeded);
    assert_eq!(snapshot.result, Some(json!("hello world hi")));
    assert!(snapshot.completed_at.is_some());
}

// ---------------------------------------------------------------------------
// Test: a job is claimed at most once
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn job_is_claimed_once(pool: PgPool) {
    let broker = PgBroker::new(pool);
    broker.enqueue("echo", &json!({})).await.unwrap();

    assert!(broker.claim("a").await.unwrap().is_some());
    assert!(broker.claim("b").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Test: failure metadata is stored and terminal states are final
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn failure_is_recorded_and_final(pool: PgPool) {
    let broker = PgBroker::new(pool);
    let id = broker.enqueue("summarize_checklist", &json!({})).await.unwrap();
    broker.claim("w").await.unwrap();

    let failure = JobFailure {
        kind: ErrorKind::ValidationError,
        message: "$: missing required field `summary`".into(),
        details: json!({ "job_id": id.to_string(), "stage": "summary" }),
    };
    broker
        .report(id, &JobOutcome::Failed(failure.clone()))
        .await
        .unwrap();

    let snapshot = broker.lookup(id).await.unwrap().unwrap();
    assert_eq!(snapshot.state, JobState::Failed);
    assert_eq!(snapshot.failure, Some(failure));

    assert_matches!(
        broker.report(id, &JobOutcome::Succeeded(json!(1))).await,
        Err(BrokerError::NotRunning(_))
    );
}

// ---------------------------------------------------------------------------
// Test: unknown ids and purge
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn purge_removes_old_terminal_jobs_only(pool: PgPool) {
    let broker = PgBroker::new(pool);
    assert!(broker
        .lookup(uuid::Uuid::new_v4())
        .await
        .unwrap()
        .is_none());

    let done = broker.enqueue("echo", &json!({})).await.unwrap();
    broker.claim("w").await.unwrap();
    broker
        .report(done, &JobOutcome::Succeeded(json!(null)))
        .await
        .unwrap();
    let waiting = broker.enqueue("echo", &json!({})).await.unwrap();

    let purged = broker
        .purge_finished_before(chrono::Utc::now() + chrono::Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(purged, 1);
    assert!(broker.lookup(done).await.unwrap().is_none());
    assert!(broker.lookup(waiting).await.unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Test: heartbeats keep running jobs out of the stale set
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn stale_running_skips_fresh_heartbeats(pool: PgPool) {
    let broker = PgBroker::new(pool);
    let id = broker.enqueue("echo", &json!({})).await.unwrap();

    assert_matches!(broker.heartbeat(id).await, Err(BrokerError::NotRunning(_)));

    broker.claim("w").await.unwrap();
    broker.heartbeat(id).await.unwrap();

    let past = chrono::Utc::now() - chrono::Duration::minutes(1);
    assert!(broker.stale_running(past).await.unwrap().is_empty());

    let future = chrono::Utc::now() + chrono::Duration::minutes(1);
    let stale = broker.stale_running(future).await.unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].id, id);
    assert_eq!(stale[0].job_type, "echo");
}
