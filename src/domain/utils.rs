pub mod file_ops;
pub mod id;
pub mod statistics;
pub mod time;
