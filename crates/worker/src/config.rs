use std::time::Duration;

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent worker loops.
    pub concurrency: usize,
    /// Sleep between claim attempts while the queue is empty.
    pub poll_interval: Duration,
    /// Prefix for worker names recorded on claimed jobs.
    pub name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            poll_interval: Duration::from_millis(500),
            name: format!("worker-{}", std::process::id()),
        }
    }
}

impl WorkerConfig {
    /// Load from environment variables with defaults.
    ///
    /// | Env Var                   | Default        |
    /// |---------------------------|----------------|
    /// | `WORKER_CONCURRENCY`      | `4`            |
    /// | `WORKER_POLL_INTERVAL_MS` | `500`          |
    /// | `WORKER_NAME`             | `worker-<pid>` |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let concurrency = std::env::var("WORKER_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.concurrency);

        let poll_interval = std::env::var("WORKER_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        let name = std::env::var("WORKER_NAME")
            .ok()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(defaults.name);

        Self {
            concurrency,
            poll_interval,
            name,
        }
    }
}
