//! Periodic recovery of running jobs whose worker stopped heartbeating.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use jobq_core::broker::Broker;
use jobq_core::result_store::ResultStore;
use jobq_worker::recovery::recover_stale_jobs;
use tokio_util::sync::CancellationToken;

/// How often running jobs are checked.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the recovery loop until `cancel` is triggered.
///
/// Each tick closes running jobs with no heartbeat in the last
/// `stale_after_secs` seconds.
pub async fn run(
    broker: Arc<dyn Broker>,
    results: Arc<dyn ResultStore>,
    stale_after_secs: u64,
    cancel: CancellationToken,
) {
    tracing::info!(
        stale_after_secs,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Stale job recovery task started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stale job recovery task stopping");
                break;
            }
            _ = interval.tick() => {
                sweep_once(broker.as_ref(), results.as_ref(), stale_after_secs).await;
            }
        }
    }
}

/// One recovery pass. Errors are logged, never propagated.
pub async fn sweep_once(
    broker: &dyn Broker,
    results: &dyn ResultStore,
    stale_after_secs: u64,
) -> u64 {
    let Some(cutoff) = i64::try_from(stale_after_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|window| Utc::now().checked_sub_signed(window))
    else {
        tracing::error!(stale_after_secs, "Stale job recovery: threshold out of range, skipping");
        return 0;
    };

    match recover_stale_jobs(broker, results, cutoff).await {
        Ok(0) => {
            tracing::debug!("Stale job recovery: nothing to recover");
            0
        }
        Ok(recovered) => {
            tracing::info!(recovered, "Stale job recovery: closed abandoned jobs");
            recovered
        }
        Err(e) => {
            tracing::error!(error = %e, "Stale job recovery failed");
            0
        }
    }
}
