use chrono::TimeDelta;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::api::config_dto::{CloudConfigDto, RunConfigDto};
use crate::domain::backend::run_mode::RunMode;
use crate::domain::utils::time::hours;
use crate::error::{ConversionError, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleMode {
    /// Run one cycle, starting right away.
    SingleShot,
    /// Chain cycles every interval until the scenario's last cycle.
    Continuous,
}

impl fmt::Display for CycleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleMode::SingleShot => write!(f, "single_shot"),
            CycleMode::Continuous => write!(f, "continuous"),
        }
    }
}

impl FromStr for CycleMode {
    type Err = ConversionError;

    fn from_str(mode: &str) -> Result<CycleMode, Self::Err> {
        match mode.to_lowercase().as_str() {
            "single_shot" | "single-shot" => Ok(CycleMode::SingleShot),
            "continuous" => Ok(CycleMode::Continuous),
            _ => Err(ConversionError::UnknownCycleMode(mode.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    pub server_url: String,
    pub namespace: String,
    pub workflow_template: String,
    pub token: Option<String>,
}

impl From<CloudConfigDto> for CloudConfig {
    fn from(dto: CloudConfigDto) -> Self {
        CloudConfig {
            server_url: dto.server_url.trim_end_matches('/').to_string(),
            namespace: dto.namespace,
            workflow_template: dto.workflow_template,
            token: dto.token,
        }
    }
}

/// Validated run configuration, passed explicitly to every component of a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub main_path: PathBuf,
    pub mode: CycleMode,
    pub run_mode: RunMode,
    pub interval_hours: i64,
    pub delay: TimeDelta,
    pub catch_up: bool,
    pub poll_interval: Duration,
    pub make_webviewer: bool,
    pub clean_up: bool,
    pub write_statistics: bool,
    pub worker_name: String,
    pub cloud: Option<CloudConfig>,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl RunConfig {
    pub fn interval(&self) -> TimeDelta {
        TimeDelta::hours(self.interval_hours)
    }

    /// Fails when the run folder is missing, so no cycle starts on a broken setup.
    pub fn check_paths(&self) -> Result<(), Error> {
        if !self.main_path.is_dir() {
            return Err(Error::ConfigurationError(format!("Main path '{}' does not exist.", self.main_path.display())));
        }
        Ok(())
    }
}

fn default_worker_name() -> String {
    std::env::var("HOSTNAME").or_else(|_| std::env::var("COMPUTERNAME")).unwrap_or_else(|_| "localhost".to_string())
}

impl TryFrom<RunConfigDto> for RunConfig {
    type Error = Error;

    fn try_from(dto: RunConfigDto) -> Result<Self, Self::Error> {
        if dto.main_path.trim().is_empty() {
            return Err(Error::ConfigurationError("'main_path' must not be empty.".to_string()));
        }
        if !(1..=24).contains(&dto.interval_hours) {
            return Err(Error::ConfigurationError(format!("'interval_hours' must be within 1..=24, got {}.", dto.interval_hours)));
        }
        if dto.delay_hours < 0.0 {
            return Err(Error::ConfigurationError("'delay_hours' must not be negative.".to_string()));
        }
        if !(dto.poll_interval_s > 0.0) {
            return Err(Error::ConfigurationError("'poll_interval_s' must be positive.".to_string()));
        }

        let mode = CycleMode::from_str(&dto.mode)?;
        let run_mode = RunMode::from_str(&dto.run_mode)?;
        let cloud = dto.cloud.map(CloudConfig::from);

        if run_mode == RunMode::Cloud && cloud.is_none() {
            return Err(Error::ConfigurationError("Run mode 'cloud' requires a 'cloud' section.".to_string()));
        }

        let main_path = PathBuf::from(&dto.main_path);
        let log_dir = PathBuf::from(&dto.log_dir);
        let log_dir = if log_dir.is_absolute() { log_dir } else { main_path.join(log_dir) };

        Ok(RunConfig {
            main_path,
            mode,
            run_mode,
            interval_hours: dto.interval_hours,
            delay: hours(dto.delay_hours),
            catch_up: dto.catch_up,
            poll_interval: Duration::from_secs_f64(dto.poll_interval_s),
            make_webviewer: dto.make_webviewer,
            clean_up: dto.clean_up,
            write_statistics: dto.write_statistics,
            worker_name: dto.worker_name.unwrap_or_else(default_worker_name),
            cloud,
            log_dir,
            log_level: dto.log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(value: serde_json::Value) -> RunConfigDto {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::try_from(dto(serde_json::json!({ "main_path": "/data/run" }))).unwrap();

        assert_eq!(config.mode, CycleMode::Continuous);
        assert_eq!(config.run_mode, RunMode::Serial);
        assert_eq!(config.interval(), TimeDelta::hours(6));
        assert_eq!(config.delay, TimeDelta::zero());
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.log_dir, PathBuf::from("/data/run/logs"));
        assert!(config.write_statistics);
        assert!(!config.catch_up);
    }

    #[test]
    fn test_invalid_values() {
        let err = RunConfig::try_from(dto(serde_json::json!({ "main_path": "/x", "run_mode": "cloud" }))).unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));

        let err = RunConfig::try_from(dto(serde_json::json!({ "main_path": "/x", "mode": "forever" }))).unwrap_err();
        assert!(matches!(err, Error::ConversionError(ConversionError::UnknownCycleMode(_))));

        let err = RunConfig::try_from(dto(serde_json::json!({ "main_path": "/x", "interval_hours": 0 }))).unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));

        let err = RunConfig::try_from(dto(serde_json::json!({ "main_path": "" }))).unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));
    }

    #[test]
    fn test_cloud_section() {
        let config = RunConfig::try_from(dto(serde_json::json!({
            "main_path": "/x",
            "run_mode": "cloud",
            "cloud": { "server_url": "https://argo.example.org/", "workflow_template": "run-model" }
        })))
        .unwrap();

        let cloud = config.cloud.unwrap();
        assert_eq!(cloud.server_url, "https://argo.example.org");
        assert_eq!(cloud.namespace, "argo");
    }

    #[test]
    fn test_missing_main_path_is_configuration_error() {
        let config = RunConfig::try_from(dto(serde_json::json!({ "main_path": "/definitely/not/here/42" }))).unwrap();
        assert!(matches!(config.check_paths(), Err(Error::ConfigurationError(_))));
    }
}
