pub mod cycle;
pub mod cycle_context;
pub mod cycle_scheduler;
pub mod end_of_cycle;
pub mod job_scheduler;
