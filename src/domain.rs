pub mod backend;
pub mod clock;
pub mod cluster;
pub mod config;
pub mod model;
pub mod scenario;
pub mod scheduler;
pub mod time_window;
pub mod utils;
