use std::sync::Arc;

use jobq_core::broker::Broker;
use jobq_core::result_store::ResultStore;
use jobq_pipeline::dispatch::TaskDispatcher;
use jobq_pipeline::registry::JobRegistry;
use jobq_pipeline::status::StatusTracker;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: TaskDispatcher,
    pub tracker: StatusTracker,
    pub results: Arc<dyn ResultStore>,
    /// Used directly only for health checks.
    pub broker: Arc<dyn Broker>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        broker: Arc<dyn Broker>,
        results: Arc<dyn ResultStore>,
        registry: Arc<JobRegistry>,
        config: ServerConfig,
    ) -> Self {
        Self {
            dispatcher: TaskDispatcher::new(broker.clone(), registry.clone()),
            tracker: StatusTracker::new(broker.clone(), results.clone(), registry),
            results,
            broker,
            config: Arc::new(config),
        }
    }
}
