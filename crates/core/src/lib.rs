//! Domain types for the jobq job engine.
//!
//! Pure logic and trait seams only: job identity and life-cycle states, the
//! error taxonomy, the structured-output schema validator, and the broker /
//! result-store abstractions (plus in-memory implementations of both).

pub mod broker;
pub mod error;
pub mod job_state;
pub mod memory;
pub mod result_store;
pub mod schema;
pub mod types;
