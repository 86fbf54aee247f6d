pub mod cycle_paths;
pub mod nesting;
pub mod scenario;
