use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary written as `cycle_info.json` into the cycle folder once all models are done.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CycleInfoDto {
    pub scenario: String,
    pub cycle: String,
    pub start_time: DateTime<Utc>,
    pub stop_time: DateTime<Utc>,

    #[serde(default)]
    pub reference_date: Option<DateTime<Utc>>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_s: i64,
    pub models: Vec<ModelInfoDto>,

    /// Models dropped by cluster admission.
    #[serde(default)]
    pub removed: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelInfoDto {
    pub name: String,
    pub long_name: String,
    pub model_type: String,
    pub status: String,

    #[serde(default)]
    pub executed_by: Option<String>,
}
