pub mod backend_mock;
pub mod cloud_backend;
pub mod execution_backend_trait;
pub mod parallel_backend;
pub mod run_mode;
pub mod sentinel;
pub mod serial_backend;
