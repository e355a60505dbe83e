//! Job types and the submission-side services of the jobq engine.
//!
//! - [`registry`]: static mapping from job-type name to handler.
//! - [`handlers`]: the built-in job types (`echo`, `sleep`, `summarize_checklist`).
//! - [`stage`]: validation between sequential stages of a multi-stage job.
//! - [`llm`]: client for the external structured-generation service.
//! - [`dispatch`]: the Task Dispatcher.
//! - [`status`]: the Status Tracker.

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod registry;
pub mod stage;
pub mod status;
