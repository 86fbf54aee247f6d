use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, RwLock};

use crate::domain::clock::clock::Clock;

/// Settable clock shared between a test and the scheduler under test.
#[derive(Debug, Clone)]
pub struct MockClock {
    pub time: Arc<RwLock<DateTime<Utc>>>,
}

impl MockClock {
    pub fn new(time: DateTime<Utc>) -> MockClock {
        MockClock { time: Arc::new(RwLock::new(time)) }
    }

    pub fn set_current_time(&self, time: DateTime<Utc>) {
        *self.time.write().unwrap() = time;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.time.write().unwrap();
        *guard += delta;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.read().unwrap()
    }
}
