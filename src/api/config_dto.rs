use serde::{Deserialize, Serialize};

/// Run configuration as found in `config.json` of a run folder.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunConfigDto {
    pub main_path: String,

    #[serde(default = "default_mode")]
    pub mode: String,

    #[serde(default = "default_run_mode")]
    pub run_mode: String,

    #[serde(default = "default_interval_hours")]
    pub interval_hours: i64,

    #[serde(default)]
    pub delay_hours: f64,

    #[serde(default)]
    pub catch_up: bool,

    #[serde(default = "default_poll_interval_s")]
    pub poll_interval_s: f64,

    #[serde(default)]
    pub make_webviewer: bool,

    #[serde(default)]
    pub clean_up: bool,

    #[serde(default = "default_true")]
    pub write_statistics: bool,

    #[serde(default)]
    pub worker_name: Option<String>,

    #[serde(default)]
    pub cloud: Option<CloudConfigDto>,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Connection settings of the workflow server used by the cloud backend.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CloudConfigDto {
    pub server_url: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    pub workflow_template: String,

    #[serde(default)]
    pub token: Option<String>,
}

fn default_mode() -> String {
    "continuous".to_string()
}

fn default_run_mode() -> String {
    "serial".to_string()
}

fn default_interval_hours() -> i64 {
    6
}

fn default_poll_interval_s() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_namespace() -> String {
    "argo".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
