use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::domain::clock::clock_mock::MockClock;
use crate::error::{Error, Result};

/// Timer abstraction that paces the cycle driver.
///
/// `wait_until` arms the one-shot timer of a cycle start, `tick` yields between two
/// job scheduler ticks. Both return [`Error::Cancelled`] once the pipeline is stopped.
#[async_trait]
pub trait Ticker: std::fmt::Debug + Send {
    async fn wait_until(&mut self, instant: DateTime<Utc>, now: DateTime<Utc>) -> Result<()>;

    async fn tick(&mut self) -> Result<()>;
}

/// Wall clock ticker backed by `tokio::time`.
#[derive(Debug, Clone)]
pub struct TokioTicker {
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl TokioTicker {
    pub fn new(poll_interval: Duration, cancel: CancellationToken) -> Self {
        TokioTicker { poll_interval, cancel }
    }

    async fn sleep(&self, duration: Duration) -> Result<()> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

#[async_trait]
impl Ticker for TokioTicker {
    async fn wait_until(&mut self, instant: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        let delay = (instant - now).to_std().unwrap_or(Duration::ZERO);
        if delay > Duration::ZERO {
            log::info!("Waiting {} s until {} UTC.", delay.as_secs(), instant.format("%Y-%m-%d %H:%M:%S"));
        }
        self.sleep(delay).await
    }

    async fn tick(&mut self) -> Result<()> {
        self.sleep(self.poll_interval).await
    }
}

/// Ticker that never sleeps, so tests can drive the scheduler tick by tick.
///
/// Every wait target is recorded and, when a [`MockClock`] is attached, the clock jumps
/// to the target (and by `tick_delta` on each tick). After `max_ticks` ticks the ticker
/// reports cancellation so a broken test cannot spin forever.
#[derive(Debug, Clone)]
pub struct ManualTicker {
    pub ticks: Arc<AtomicUsize>,
    pub waits: Arc<Mutex<Vec<DateTime<Utc>>>>,
    clock: Option<MockClock>,
    tick_delta: TimeDelta,
    max_ticks: usize,
}

impl ManualTicker {
    pub fn new(max_ticks: usize) -> Self {
        ManualTicker {
            ticks: Arc::new(AtomicUsize::new(0)),
            waits: Arc::new(Mutex::new(Vec::new())),
            clock: None,
            tick_delta: TimeDelta::zero(),
            max_ticks,
        }
    }

    pub fn with_clock(mut self, clock: MockClock, tick_delta: TimeDelta) -> Self {
        self.clock = Some(clock);
        self.tick_delta = tick_delta;
        self
    }

    pub fn tick_count(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn recorded_waits(&self) -> Vec<DateTime<Utc>> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn wait_until(&mut self, instant: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        self.waits.lock().unwrap().push(instant);
        if let Some(clock) = &self.clock {
            if instant > now {
                clock.set_current_time(instant);
            }
        }
        Ok(())
    }

    async fn tick(&mut self) -> Result<()> {
        let ticks = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        if ticks > self.max_ticks {
            return Err(Error::Cancelled);
        }
        if let Some(clock) = &self.clock {
            clock.advance(self.tick_delta);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::clock::Clock;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_tokio_ticker_cancellation() {
        let cancel = CancellationToken::new();
        let mut ticker = TokioTicker::new(Duration::from_secs(3600), cancel.clone());
        cancel.cancel();

        let result = ticker.tick().await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_tokio_ticker_past_instant_returns_immediately() {
        let mut ticker = TokioTicker::new(Duration::from_millis(1), CancellationToken::new());
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let past = now - TimeDelta::hours(1);

        ticker.wait_until(past, now).await.unwrap();
        ticker.tick().await.unwrap();
    }

    #[tokio::test]
    async fn test_manual_ticker_advances_clock_and_stops() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = MockClock::new(start);
        let mut ticker = ManualTicker::new(2).with_clock(clock.clone(), TimeDelta::minutes(1));

        ticker.wait_until(start + TimeDelta::hours(1), start).await.unwrap();
        assert_eq!(clock.now(), start + TimeDelta::hours(1));

        ticker.tick().await.unwrap();
        ticker.tick().await.unwrap();
        assert!(matches!(ticker.tick().await, Err(Error::Cancelled)));
        assert_eq!(ticker.tick_count(), 3);
        assert_eq!(ticker.recorded_waits(), vec![start + TimeDelta::hours(1)]);
    }
}
