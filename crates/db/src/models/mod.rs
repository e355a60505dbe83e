pub mod job;
pub mod status;
pub mod task_result;
