use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::model::model::{Model, PeakBoundary};
use crate::error::{Error, Result};

/// Computes the peak boundary total water level of a model from the output of its parent.
pub trait BoundaryValueProvider: std::fmt::Debug + Send + Sync {
    fn peak_boundary(&self, model: &Model, parent: &Model, hm0_fraction: f64) -> Result<PeakBoundary>;
}

#[derive(Debug, Deserialize)]
struct BoundaryRecord {
    time: String,
    water_level: f64,
    #[serde(default)]
    hm0: Option<f64>,
}

/// Reads the boundary time series the parent wrote for the model,
/// `<parent output>/boundary_<model>.csv` with columns `time,water_level[,hm0]`.
#[derive(Debug, Default, Clone)]
pub struct CsvBoundaryProvider;

impl CsvBoundaryProvider {
    pub fn file_path(model: &Model, parent: &Model) -> PathBuf {
        parent.paths.cycle_output.join(format!("boundary_{}.csv", model.id))
    }
}

impl BoundaryValueProvider for CsvBoundaryProvider {
    fn peak_boundary(&self, model: &Model, parent: &Model, hm0_fraction: f64) -> Result<PeakBoundary> {
        let path = CsvBoundaryProvider::file_path(model, parent);
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(&path)?;

        let mut peak: Option<PeakBoundary> = None;
        for record in reader.deserialize() {
            let record: BoundaryRecord = record?;
            let value = record.water_level + hm0_fraction * record.hm0.unwrap_or(0.0) - model.mhhw;

            if peak.map(|p| value > p.value).unwrap_or(true) {
                peak = Some(PeakBoundary { value, time: parse_time(&record.time) });
            }
        }

        peak.ok_or_else(|| Error::BoundaryValueError {
            model: model.id.to_string(),
            reason: format!("{} contains no records", path.display()),
        })
    }
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").ok().map(|naive| naive.and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::model_type::ModelType;
    use crate::domain::scenario::cycle_paths::CyclePaths;
    use chrono::TimeZone;
    use std::fs;

    #[test]
    fn test_peak_from_csv() {
        let root = std::env::temp_dir().join(format!("boundary_{}", uuid::Uuid::new_v4()));
        let paths = CyclePaths::new(&root, "s", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        let mut parent = Model::new("coarse", ModelType::Delft3dFm);
        parent.paths = paths.model_paths(&parent.id, parent.model_type);
        let mut child = Model::new("coast", ModelType::Sfincs);
        child.mhhw = 0.5;

        fs::create_dir_all(&parent.paths.cycle_output).unwrap();
        fs::write(
            CsvBoundaryProvider::file_path(&child, &parent),
            "time,water_level,hm0\n2024-01-01T03:00:00Z,1.0,1.0\n2024-01-01T06:00:00Z,1.5,0.0\n2024-01-01 09:00:00,1.2,2.0\n",
        )
        .unwrap();

        let peak = CsvBoundaryProvider.peak_boundary(&child, &parent, 0.2).unwrap();
        assert!((peak.value - 1.1).abs() < 1e-9);
        assert_eq!(peak.time, Some(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()));

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let parent = Model::new("coarse", ModelType::Delft3dFm);
        let child = Model::new("coast", ModelType::Sfincs);
        assert!(CsvBoundaryProvider.peak_boundary(&child, &parent, 0.2).is_err());
    }
}
