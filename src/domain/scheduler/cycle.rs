use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::config::{CycleMode, RunConfig};
use crate::domain::utils::time::{floor_to_interval, format_cycle_string};

/// Timing of one forecast cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub time: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    /// Cycle to chain to once this one is complete, `None` ends the run.
    pub next: Option<DateTime<Utc>>,
    pub cycle_string: String,
}

impl Cycle {
    pub fn new(time: DateTime<Utc>, runtime: TimeDelta, next: Option<DateTime<Utc>>) -> Self {
        Cycle { time, stop: time + runtime, next, cycle_string: format_cycle_string(time) }
    }
}

/// Cycle instant: an explicit time wins over the scenario's own cycle, otherwise the
/// current time rounded down to the cycle interval.
pub fn resolve_cycle_time(
    explicit: Option<DateTime<Utc>>,
    scenario_cycle: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    interval_hours: i64,
) -> DateTime<Utc> {
    explicit.or(scenario_cycle).unwrap_or_else(|| floor_to_interval(now, interval_hours))
}

/// # Returns
/// `None` in single shot mode or once `last_cycle` is reached. With `catch_up` the next
/// cycle skips ahead to the current interval when the run fell behind.
pub fn next_cycle_time(
    cycle: DateTime<Utc>,
    config: &RunConfig,
    last_cycle: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if config.mode == CycleMode::SingleShot {
        return None;
    }

    if last_cycle.map(|last| cycle >= last).unwrap_or(false) {
        return None;
    }

    let mut next = cycle + config.interval();
    if config.catch_up {
        next = next.max(floor_to_interval(now, config.interval_hours));
    }
    Some(next)
}

/// Wall clock instant at which the job scheduler starts working on the cycle.
pub fn start_time(cycle: DateTime<Utc>, config: &RunConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    match config.mode {
        CycleMode::SingleShot => now,
        CycleMode::Continuous => (cycle + config.delay).max(now),
    }
}
