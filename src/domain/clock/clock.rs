use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Source of "now" for the cycle driver.
///
/// Production code uses [`SystemClock`], tests inject a settable clock so cycle times,
/// catch-up and start delays can be checked without waiting for the wall clock.
pub trait Clock: std::fmt::Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type SharedClock = Arc<dyn Clock>;

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn shared() -> SharedClock {
        Arc::new(SystemClock)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
