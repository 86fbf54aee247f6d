use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::error::Result;

/// `tracing` target of all lifecycle events (status transitions, submissions, cluster
/// decisions, cycle start and end).
pub const ANALYTICS_TARGET: &str = "cycle_analytics";

/// Each row of the statistics file consists of a set of key-value-pairs.
/// This enum specifies all allowed keys and thus the columns of the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatParameter {
    /// Cycle string, e.g. `20240101_00z`.
    Cycle,

    Scenario,

    ModelName,

    ModelType,

    /// `deterministic` or `tide_only`
    Role,

    /// Final status of the model in this cycle
    Status,

    Priority,

    FlowStart,
    FlowStop,
    FlowRestart,

    WaveStart,
    WaveStop,
    WaveRestart,

    /// Peak boundary water level as seen by cluster admission
    PeakBoundary,

    /// Worker or backend that executed the job
    ExecutedBy,
}

impl StatParameter {
    /// Column order of the CSV file.
    pub const ALL: [StatParameter; 15] = [
        StatParameter::Cycle,
        StatParameter::Scenario,
        StatParameter::ModelName,
        StatParameter::ModelType,
        StatParameter::Role,
        StatParameter::Status,
        StatParameter::Priority,
        StatParameter::FlowStart,
        StatParameter::FlowStop,
        StatParameter::FlowRestart,
        StatParameter::WaveStart,
        StatParameter::WaveStop,
        StatParameter::WaveRestart,
        StatParameter::PeakBoundary,
        StatParameter::ExecutedBy,
    ];

    pub fn headers() -> Vec<String> {
        StatParameter::ALL.iter().map(|param| format!("{:?}", param)).collect()
    }
}

/// Values are stored in their native format and only formatted when written.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum StatValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl From<i32> for StatValue {
    fn from(v: i32) -> Self {
        StatValue::Integer(v as i64)
    }
}

impl From<i64> for StatValue {
    fn from(v: i64) -> Self {
        StatValue::Integer(v)
    }
}

impl From<f64> for StatValue {
    fn from(v: f64) -> Self {
        StatValue::Float(v)
    }
}

impl From<String> for StatValue {
    fn from(v: String) -> Self {
        StatValue::Text(v)
    }
}

impl From<&str> for StatValue {
    fn from(v: &str) -> Self {
        StatValue::Text(v.to_string())
    }
}

impl From<bool> for StatValue {
    fn from(v: bool) -> Self {
        StatValue::Bool(v)
    }
}

impl StatValue {
    fn render(&self) -> String {
        match self {
            StatValue::Text(t) => t.clone(),
            StatValue::Integer(i) => i.to_string(),
            StatValue::Float(f) => f.to_string(),
            StatValue::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatisticEvent {
    data: HashMap<StatParameter, StatValue>,
}

impl StatisticEvent {
    pub fn new() -> Self {
        Self { data: HashMap::new() }
    }

    pub fn set<V: Into<StatValue>>(&mut self, param: StatParameter, value: V) -> &mut Self {
        self.data.insert(param, value.into());
        self
    }

    pub fn get(&self, param: StatParameter) -> Option<&StatValue> {
        self.data.get(&param)
    }

    /// Row in column order, missing values are written as `NA`.
    pub fn row(&self) -> Vec<String> {
        StatParameter::ALL.iter().map(|param| self.data.get(param).map(StatValue::render).unwrap_or_else(|| "NA".to_string())).collect()
    }
}

/// Writes the events as a `;` separated CSV file with a header line.
pub fn write_events(path: &Path, events: &[StatisticEvent]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(file);

    writer.write_record(StatParameter::headers())?;
    for event in events {
        writer.write_record(event.row())?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_order_and_missing_values() {
        let mut event = StatisticEvent::new();
        event.set(StatParameter::ModelName, "sf").set(StatParameter::Priority, 10).set(StatParameter::PeakBoundary, 1.5);

        let row = event.row();
        assert_eq!(row.len(), StatParameter::ALL.len());
        assert_eq!(row[0], "NA");
        assert_eq!(row[2], "sf");
        assert_eq!(row[6], "10");
        assert_eq!(row[13], "1.5");
    }

    #[test]
    fn test_write_events() {
        let path = std::env::temp_dir().join(format!("statistics_{}.csv", uuid::Uuid::new_v4()));
        let mut event = StatisticEvent::new();
        event.set(StatParameter::Status, "finished");

        write_events(&path, &[event]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("Cycle;Scenario;ModelName"));
        assert!(lines.next().unwrap().contains(";finished;"));

        std::fs::remove_file(path).unwrap();
    }
}
