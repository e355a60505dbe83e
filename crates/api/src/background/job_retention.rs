//! Periodic purge of finished jobs from the broker.
//!
//! Only broker records are removed; stored results are kept indefinitely.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use jobq_core::broker::Broker;
use jobq_core::types::Timestamp;
use tokio_util::sync::CancellationToken;

/// How often the cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Run the retention loop until `cancel` is triggered.
///
/// Each tick purges terminal jobs completed more than `retention_hours` ago.
pub async fn run(broker: Arc<dyn Broker>, retention_hours: i64, cancel: CancellationToken) {
    tracing::info!(
        retention_hours,
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Job retention task started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job retention task stopping");
                break;
            }
            _ = interval.tick() => {
                match retention_cutoff(retention_hours) {
                    Some(cutoff) => {
                        purge_once(broker.as_ref(), cutoff).await;
                    }
                    None => tracing::error!(retention_hours, "Job retention: cutoff out of range, skipping"),
                }
            }
        }
    }
}

/// `now - retention_hours`, or `None` when the window is not positive or
/// does not fit a timestamp.
pub fn retention_cutoff(retention_hours: i64) -> Option<Timestamp> {
    if retention_hours <= 0 {
        return None;
    }
    let window = TimeDelta::try_hours(retention_hours)?;
    Utc::now().checked_sub_signed(window)
}

/// One cleanup pass removing terminal jobs completed before `cutoff`.
/// Errors are logged, never propagated.
pub async fn purge_once(broker: &dyn Broker, cutoff: Timestamp) -> u64 {
    match broker.purge_finished_before(cutoff).await {
        Ok(purged) => {
            if purged > 0 {
                tracing::info!(purged, "Job retention: purged finished jobs");
            } else {
                tracing::debug!("Job retention: nothing to purge");
            }
            purged
        }
        Err(e) => {
            tracing::error!(error = %e, "Job retention: cleanup failed");
            0
        }
    }
}
