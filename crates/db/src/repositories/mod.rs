//! Repository layer: one zero-sized type per table, with associated async
//! functions taking a pool reference.

pub mod job_repo;
pub mod task_result_repo;

pub use job_repo::JobRepo;
pub use task_result_repo::TaskResultRepo;
