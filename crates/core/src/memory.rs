//! In-process [`Broker`] and [`ResultStore`] implementations.
//!
//! Used for tests and single-process development setups. Both are cheap to
//! share behind an `Arc` and hold their state behind a `tokio::sync::Mutex`.
//! Nothing here survives a restart; use the Postgres implementations in
//! `jobq-db` for durable storage.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::broker::{Broker, BrokerError};
use crate::job_state::{ClaimedJob, JobOutcome, JobSnapshot, JobState};
use crate::result_store::{ResultQuery, ResultStore, StoreError, TaskResult};
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// MemoryBroker
// ---------------------------------------------------------------------------

struct Entry {
    snapshot: JobSnapshot,
    payload: serde_json::Value,
    /// Set on claim, refreshed by [`Broker::heartbeat`].
    heartbeat_at: Option<Timestamp>,
}

#[derive(Default)]
struct Queue {
    jobs: HashMap<JobId, Entry>,
    pending: VecDeque<JobId>,
}

/// FIFO broker held entirely in memory.
#[derive(Default)]
pub struct MemoryBroker {
    queue: Mutex<Queue>,
    offline: AtomicBool,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the broker becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of jobs waiting to be claimed.
    pub async fn pending_count(&self) -> usize {
        self.queue.lock().await.pending.len()
    }

    fn ensure_online(&self) -> Result<(), BrokerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BrokerError::Unavailable(
                "in-memory broker is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn enqueue(
        &self,
        job_type: &str,
        payload: &serde_json::Value,
    ) -> Result<JobId, BrokerError> {
        self.ensure_online()?;
        let id = uuid::Uuid::new_v4();
        let snapshot = JobSnapshot {
            id,
            job_type: job_type.to_string(),
            state: JobState::Pending,
            result: None,
            failure: None,
            submitted_at: Utc::now(),
            completed_at: None,
        };
        let mut queue = self.queue.lock().await;
        queue.jobs.insert(
            id,
            Entry {
                snapshot,
                payload: payload.clone(),
                heartbeat_at: None,
            },
        );
        queue.pending.push_back(id);
        Ok(id)
    }

    async fn claim(&self, _worker: &str) -> Result<Option<ClaimedJob>, BrokerError> {
        self.ensure_online()?;
        let mut queue = self.queue.lock().await;
        while let Some(id) = queue.pending.pop_front() {
            // Purged while still queued: skip.
            let Some(entry) = queue.jobs.get_mut(&id) else {
                continue;
            };
            if !entry.snapshot.state.can_transition_to(JobState::Running) {
                continue;
            }
            entry.snapshot.state = JobState::Running;
            entry.heartbeat_at = Some(Utc::now());
            return Ok(Some(ClaimedJob {
                id,
                job_type: entry.snapshot.job_type.clone(),
                payload: entry.payload.clone(),
            }));
        }
        Ok(None)
    }

    async fn report(&self, job_id: JobId, outcome: &JobOutcome) -> Result<(), BrokerError> {
        self.ensure_online()?;
        let mut queue = self.queue.lock().await;
        let snapshot = &mut queue
            .jobs
            .get_mut(&job_id)
            .ok_or(BrokerError::NotRunning(job_id))?
            .snapshot;
        if !snapshot.state.can_transition_to(outcome.state()) {
            return Err(BrokerError::NotRunning(job_id));
        }
        snapshot.state = outcome.state();
        snapshot.completed_at = Some(Utc::now());
        match outcome {
            JobOutcome::Succeeded(value) => snapshot.result = Some(value.clone()),
            JobOutcome::Failed(failure) => snapshot.failure = Some(failure.clone()),
        }
        Ok(())
    }

    async fn lookup(&self, job_id: JobId) -> Result<Option<JobSnapshot>, BrokerError> {
        self.ensure_online()?;
        let queue = self.queue.lock().await;
        Ok(queue.jobs.get(&job_id).map(|entry| entry.snapshot.clone()))
    }

    async fn heartbeat(&self, job_id: JobId) -> Result<(), BrokerError> {
        self.ensure_online()?;
        let mut queue = self.queue.lock().await;
        match queue.jobs.get_mut(&job_id) {
            Some(entry) if entry.snapshot.state == JobState::Running => {
                entry.heartbeat_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(BrokerError::NotRunning(job_id)),
        }
    }

    async fn stale_running(&self, cutoff: Timestamp) -> Result<Vec<ClaimedJob>, BrokerError> {
        self.ensure_online()?;
        let queue = self.queue.lock().await;
        Ok(queue
            .jobs
            .values()
            .filter(|entry| {
                entry.snapshot.state == JobState::Running
                    && entry.heartbeat_at.is_some_and(|at| at < cutoff)
            })
            .map(|entry| ClaimedJob {
                id: entry.snapshot.id,
                job_type: entry.snapshot.job_type.clone(),
                payload: entry.payload.clone(),
            })
            .collect())
    }

    async fn purge_finished_before(&self, cutoff: Timestamp) -> Result<u64, BrokerError> {
        self.ensure_online()?;
        let mut queue = self.queue.lock().await;
        let before = queue.jobs.len();
        queue.jobs.retain(|_, entry| {
            !(entry.snapshot.state.is_terminal()
                && entry.snapshot.completed_at.is_some_and(|at| at < cutoff))
        });
        Ok((before - queue.jobs.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), BrokerError> {
        self.ensure_online()
    }
}

// ---------------------------------------------------------------------------
// MemoryResultStore
// ---------------------------------------------------------------------------

/// Result store keyed by job id, held in memory.
#[derive(Default)]
pub struct MemoryResultStore {
    records: Mutex<HashMap<JobId, TaskResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn save(
        &self,
        job_id: JobId,
        job_type_name: &str,
        result: &serde_json::Value,
    ) -> Result<TaskResult, StoreError> {
        let mut records = self.records.lock().await;
        if records.contains_key(&job_id) {
            return Err(StoreError::DuplicateResult(job_id));
        }
        let record = TaskResult {
            id: uuid::Uuid::new_v4(),
            job_id,
            job_type_name: job_type_name.to_string(),
            result: result.clone(),
            created_at: Utc::now(),
        };
        records.insert(job_id, record.clone());
        Ok(record)
    }

    async fn get(&self, job_id: JobId) -> Result<TaskResult, StoreError> {
        self.records
            .lock()
            .await
            .get(&job_id)
            .cloned()
            .ok_or(StoreError::NotFound(job_id))
    }

    async fn list(&self, query: &ResultQuery) -> Result<Vec<TaskResult>, StoreError> {
        let records = self.records.lock().await;
        let mut matching: Vec<TaskResult> = records
            .values()
            .filter(|r| {
                query
                    .job_type_name
                    .as_deref()
                    .map_or(true, |name| r.job_type_name == name)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::job_state::{ErrorKind, JobFailure};

    #[tokio::test]
    async fn enqueue_returns_unique_ids_and_pending_state() {
        let broker = MemoryBroker::new();
        let a = broker.enqueue("echo", &json!({})).await.unwrap();
        let b = broker.enqueue("echo", &json!({})).await.unwrap();
        assert_ne!(a, b);

        let snapshot = broker.lookup(a).await.unwrap().unwrap();
        assert_eq!(snapshot.state, JobState::Pending);
        assert_eq!(broker.pending_count().await, 2);
    }

    #[tokio::test]
    async fn claim_is_fifo_and_exclusive() {
        let broker = MemoryBroker::new();
        let first = broker.enqueue("echo", &json!({ "n": 1 })).await.unwrap();
        let second = broker.enqueue("echo", &json!({ "n": 2 })).await.unwrap();

        let claimed = broker.claim("w1").await.unwrap().unwrap();
        assert_eq!(claimed.id, first);
        assert_eq!(claimed.payload, json!({ "n": 1 }));

        let claimed = broker.claim("w2").await.unwrap().unwrap();
        assert_eq!(claimed.id, second);

        assert!(broker.claim("w3").await.unwrap().is_none());
        assert_eq!(
            broker.lookup(first).await.unwrap().unwrap().state,
            JobState::Running
        );
    }

    #[tokio::test]
    async fn report_rejects_non_running_jobs() {
        let broker = MemoryBroker::new();
        let id = broker.enqueue("echo", &json!({})).await.unwrap();

        let outcome = JobOutcome::Succeeded(json!("done"));
        assert_matches!(
            broker.report(id, &outcome).await,
            Err(BrokerError::NotRunning(_))
        );

        broker.claim("w").await.unwrap();
        broker.report(id, &outcome).await.unwrap();

        let failed = JobOutcome::Failed(JobFailure {
            kind: ErrorKind::ExecutionError,
            message: "late".into(),
            details: json!({}),
        });
        assert_matches!(
            broker.report(id, &failed).await,
            Err(BrokerError::NotRunning(_))
        );

        let snapshot = broker.lookup(id).await.unwrap().unwrap();
        assert_eq!(snapshot.state, JobState::Succeeded);
        assert_eq!(snapshot.result, Some(json!("done")));
        assert!(snapshot.completed_at.is_some());
    }

    #[tokio::test]
    async fn offline_broker_fails_enqueue() {
        let broker = MemoryBroker::new();
        broker.set_offline(true);
        assert_matches!(
            broker.enqueue("echo", &json!({})).await,
            Err(BrokerError::Unavailable(_))
        );
        assert!(broker.health_check().await.is_err());

        broker.set_offline(false);
        assert!(broker.enqueue("echo", &json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn purge_only_drops_old_terminal_jobs() {
        let broker = MemoryBroker::new();
        let done = broker.enqueue("echo", &json!({})).await.unwrap();
        broker.claim("w").await.unwrap();
        broker
            .report(done, &JobOutcome::Succeeded(json!(1)))
            .await
            .unwrap();
        let waiting = broker.enqueue("echo", &json!({})).await.unwrap();

        let purged = broker
            .purge_finished_before(Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(purged, 1);
        assert!(broker.lookup(done).await.unwrap().is_none());
        assert!(broker.lookup(waiting).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn stale_running_respects_heartbeats() {
        let broker = MemoryBroker::new();
        let id = broker.enqueue("echo", &json!({ "n": 1 })).await.unwrap();
        assert_matches!(
            broker.heartbeat(id).await,
            Err(BrokerError::NotRunning(_))
        );
        broker.claim("w").await.unwrap();

        let past = Utc::now() - chrono::Duration::seconds(60);
        let future = Utc::now() + chrono::Duration::seconds(60);
        assert!(broker.stale_running(past).await.unwrap().is_empty());

        let stale = broker.stale_running(future).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, id);
        assert_eq!(stale[0].payload, json!({ "n": 1 }));

        broker.heartbeat(id).await.unwrap();
        broker
            .report(id, &JobOutcome::Succeeded(json!(1)))
            .await
            .unwrap();
        assert!(broker.stale_running(future).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_save_is_rejected_and_first_retained() {
        let store = MemoryResultStore::new();
        let job_id = uuid::Uuid::new_v4();
        let first = json!({ "summary": "first" });

        store.save(job_id, "summarize_checklist", &first).await.unwrap();
        let err = store
            .save(job_id, "summarize_checklist", &json!({ "summary": "second" }))
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::DuplicateResult(id) if id == job_id);

        let stored = store.get(job_id).await.unwrap();
        assert_eq!(stored.result, first);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn get_unknown_is_not_found() {
        let store = MemoryResultStore::new();
        assert_matches!(
            store.get(uuid::Uuid::new_v4()).await,
            Err(StoreError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn list_filters_by_job_type() {
        let store = MemoryResultStore::new();
        store
            .save(uuid::Uuid::new_v4(), "a", &json!(1))
            .await
            .unwrap();
        store
            .save(uuid::Uuid::new_v4(), "b", &json!(2))
            .await
            .unwrap();

        let only_a = store
            .list(&ResultQuery {
                job_type_name: Some("a".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].job_type_name, "a");

        let all = store.list(&ResultQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
