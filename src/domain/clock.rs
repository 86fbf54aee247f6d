pub mod clock;
pub mod clock_mock;
pub mod ticker;
