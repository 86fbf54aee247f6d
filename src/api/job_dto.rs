use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job description written as `job.json` into every job workspace.
///
/// The run script of a model reads it to set up times, restart and nesting input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JobConfigDto {
    pub model: String,
    pub model_type: String,
    pub cycle: String,
    pub tide_only: bool,
    pub meteo_forcing: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<TimeWindowDto>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave: Option<TimeWindowDto>,

    #[serde(default)]
    pub nesting: Vec<NestingDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimeWindowDto {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,

    #[serde(default)]
    pub restart_file: Option<String>,
}

/// Output of a parent model to take boundary conditions from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NestingDto {
    pub kind: String,
    pub parent: String,
    pub output_path: String,
}

/// Descriptor written as `ready.json` for the workers of the parallel backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReadyDescriptorDto {
    pub job_id: String,
    pub model: String,
    pub model_type: String,
    pub run_script: String,
    pub ensemble: bool,
}
