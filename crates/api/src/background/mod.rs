pub mod job_retention;
pub mod stale_jobs;
