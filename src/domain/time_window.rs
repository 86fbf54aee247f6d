pub mod restart_lookup;
pub mod restart_lookup_mock;
pub mod time_window_resolver;
