use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use std::fs;

use crate::domain::model::model::{BoundaryKind, Model, RestartFile};

const RESTART_TIME_FORMAT: &str = "%Y%m%d.%H%M%S";

/// Finds restart artifacts that let a model skip its spin-up.
pub trait RestartLookup: std::fmt::Debug + Send + Sync {
    /// Latest artifact of `kind` timestamped in `(required_start - spinup, required_start]`.
    fn find(&self, model: &Model, kind: BoundaryKind, required_start: DateTime<Utc>) -> Option<RestartFile>;
}

pub fn in_restart_window(time: DateTime<Utc>, required_start: DateTime<Utc>, spinup: TimeDelta) -> bool {
    time > required_start - spinup && time <= required_start
}

pub fn latest_in_window(
    candidates: impl IntoIterator<Item = RestartFile>,
    required_start: DateTime<Utc>,
    spinup: TimeDelta,
) -> Option<RestartFile> {
    candidates.into_iter().filter(|file| in_restart_window(file.time, required_start, spinup)).max_by_key(|file| file.time)
}

/// Extracts the timestamp embedded right before a 4 character extension,
/// e.g. `sfincs.20240101.060000.rst`.
pub fn parse_restart_time(file_name: &str) -> Option<DateTime<Utc>> {
    if !file_name.is_ascii() || file_name.len() < 19 {
        return None;
    }

    let stamp = &file_name[file_name.len() - 19..file_name.len() - 4];
    NaiveDateTime::parse_from_str(stamp, RESTART_TIME_FORMAT).ok().map(|naive| naive.and_utc())
}

pub fn format_restart_time(time: DateTime<Utc>) -> String {
    time.format(RESTART_TIME_FORMAT).to_string()
}

/// Looks up restart files in the restart archive of the model (`restart/<name>/<kind>`).
#[derive(Debug, Default, Clone)]
pub struct FileRestartLookup;

impl RestartLookup for FileRestartLookup {
    fn find(&self, model: &Model, kind: BoundaryKind, required_start: DateTime<Utc>) -> Option<RestartFile> {
        let dir = model.paths.restart_dir(kind)?;

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => {
                if let Err(e) = fs::create_dir_all(dir) {
                    log::warn!("Could not create restart folder {}: {}", dir.display(), e);
                }
                return None;
            }
        };

        let candidates = entries.filter_map(|entry| entry.ok()).filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            match parse_restart_time(&name) {
                Some(time) => Some(RestartFile { time, path: entry.path() }),
                None => {
                    log::debug!("Skipping {} in restart folder of model {}, no timestamp in name.", name, model.id);
                    None
                }
            }
        });

        latest_in_window(candidates, required_start, *model.spinup.get(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::model_type::ModelType;
    use crate::domain::scenario::cycle_paths::CyclePaths;
    use chrono::TimeZone;

    fn t(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_restart_time() {
        assert_eq!(parse_restart_time("sfincs.20240101.060000.rst"), Some(t(1, 6)));
        assert_eq!(parse_restart_time("20240101.060000.nc4"), Some(t(1, 6)));
        assert_eq!(parse_restart_time("notes.txt"), None);
        assert_eq!(parse_restart_time("sfincs.2024010X.060000.rst"), None);
        assert_eq!(format_restart_time(t(1, 6)), "20240101.060000");
    }

    #[test]
    fn test_window_is_half_open() {
        let required = t(2, 0);
        let spinup = TimeDelta::hours(6);

        assert!(in_restart_window(required, required, spinup));
        assert!(!in_restart_window(required - spinup, required, spinup));
        assert!(!in_restart_window(required + TimeDelta::seconds(1), required, spinup));
        assert!(!in_restart_window(required, required, TimeDelta::zero()));
    }

    #[test]
    fn test_file_lookup_picks_latest_in_window() {
        let root = std::env::temp_dir().join(format!("restart_lookup_{}", uuid::Uuid::new_v4()));
        let paths = CyclePaths::new(&root, "scn", t(2, 0));

        let mut model = Model::new("sf", ModelType::Sfincs);
        model.spinup.flow = TimeDelta::hours(12);
        model.paths = paths.model_paths(&model.id, model.model_type);
        fs::create_dir_all(&model.paths.restart_flow).unwrap();

        for name in ["sfincs.20240101.100000.rst", "sfincs.20240101.180000.rst", "sfincs.20240102.030000.rst", "readme.txt"] {
            fs::write(model.paths.restart_flow.join(name), "").unwrap();
        }

        let found = FileRestartLookup.find(&model, BoundaryKind::Flow, t(2, 0)).unwrap();
        assert_eq!(found.time, t(1, 18));
        assert!(found.path.ends_with("sfincs.20240101.180000.rst"));

        assert!(FileRestartLookup.find(&model, BoundaryKind::Wave, t(2, 0)).is_none());
        assert!(model.paths.restart_wave.is_dir());
        assert!(FileRestartLookup.find(&model, BoundaryKind::Bw, t(2, 0)).is_none());

        fs::remove_dir_all(root).unwrap();
    }
}
