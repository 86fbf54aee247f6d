use chrono::{DateTime, NaiveDateTime, TimeDelta, Timelike, Utc};

use crate::error::ConversionError;

/// Format used for cycle folders and on the command line, e.g. `20240101_06z`.
pub const CYCLE_FORMAT: &str = "%Y%m%d_%Hz";

/// Converts a (possibly fractional) number of hours into a `TimeDelta` with ms precision.
pub fn hours(value: f64) -> TimeDelta {
    TimeDelta::milliseconds((value * 3_600_000.0).round() as i64)
}

pub fn format_cycle_string(cycle: DateTime<Utc>) -> String {
    cycle.format(CYCLE_FORMAT).to_string()
}

/// Parses `YYYYMMDD_HHz` (the trailing `z` is optional and case-insensitive).
pub fn parse_cycle_string(value: &str) -> Result<DateTime<Utc>, ConversionError> {
    let trimmed = value.trim().trim_end_matches(['z', 'Z']);

    NaiveDateTime::parse_from_str(&format!("{}00", trimmed), "%Y%m%d_%H%M")
        .map(|naive| naive.and_utc())
        .map_err(|_| ConversionError::InvalidCycleString(value.to_string()))
}

/// Rounds `time` down to the last multiple of `interval_hours` within its day.
pub fn floor_to_interval(time: DateTime<Utc>, interval_hours: i64) -> DateTime<Utc> {
    let interval = interval_hours.clamp(1, 24) as u32;
    let hour = time.hour() - time.hour() % interval;

    time.date_naive().and_hms_opt(hour, 0, 0).map(|naive| naive.and_utc()).unwrap_or(time)
}

pub fn floor_to_day(time: DateTime<Utc>) -> DateTime<Utc> {
    time.date_naive().and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cycle_string_round_trip() {
        let cycle = parse_cycle_string("20240101_06z").unwrap();
        assert_eq!(cycle, Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap());
        assert_eq!(format_cycle_string(cycle), "20240101_06z");

        assert_eq!(parse_cycle_string("20231231_18Z").unwrap(), Utc.with_ymd_and_hms(2023, 12, 31, 18, 0, 0).unwrap());
        assert!(matches!(parse_cycle_string("2024-01-01"), Err(ConversionError::InvalidCycleString(_))));
    }

    #[test]
    fn test_floor_to_interval() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 17, 42, 13).unwrap();
        assert_eq!(floor_to_interval(t, 6), Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap());
        assert_eq!(floor_to_interval(t, 1), Utc.with_ymd_and_hms(2024, 3, 5, 17, 0, 0).unwrap());
        assert_eq!(floor_to_interval(t, 24), Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
        assert_eq!(floor_to_day(t), Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_hours() {
        assert_eq!(hours(12.0), TimeDelta::hours(12));
        assert_eq!(hours(0.5), TimeDelta::minutes(30));
        assert_eq!(hours(0.0), TimeDelta::zero());
    }
}
