//! Worker Execution Engine for jobq.
//!
//! Workers claim jobs from the broker, run the registered handler, persist
//! results where the job type asks for it, and report the terminal outcome
//! back to the broker. [`recovery`] closes jobs whose worker stopped
//! heartbeating. The API server can embed a [`pool::WorkerPool`] for
//! single-process deployments; the `jobq-worker` binary runs one standalone.

pub mod config;
pub mod engine;
pub mod pool;
pub mod recovery;
pub mod shutdown;
pub mod telemetry;

pub use engine::{Worker, WorkerDeps};
pub use pool::WorkerPool;
