use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScenarioDto {
    pub name: String,

    #[serde(default)]
    pub long_name: Option<String>,

    pub runtime_hours: f64,

    /// Fixed cycle of this scenario, e.g. `20240101_00z`.
    #[serde(default)]
    pub cycle: Option<String>,

    /// No cycle after this one is scheduled.
    #[serde(default)]
    pub last_cycle: Option<String>,

    pub models: Vec<ModelDto>,

    #[serde(default)]
    pub clusters: Vec<ClusterDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModelDto {
    pub name: String,

    #[serde(default)]
    pub long_name: Option<String>,

    #[serde(rename = "type")]
    pub typ: String,

    /// Defaults are derived from the model type when absent.
    #[serde(default)]
    pub flow: Option<bool>,

    #[serde(default)]
    pub wave: Option<bool>,

    #[serde(default = "default_priority")]
    pub priority: i32,

    #[serde(default)]
    pub flow_nested: Option<String>,

    #[serde(default)]
    pub wave_nested: Option<String>,

    #[serde(default)]
    pub bw_nested: Option<String>,

    #[serde(default)]
    pub flow_spinup_hours: f64,

    #[serde(default)]
    pub wave_spinup_hours: f64,

    #[serde(default)]
    pub ensemble: bool,

    #[serde(default)]
    pub cluster: Option<String>,

    #[serde(default = "default_boundary_twl_threshold")]
    pub boundary_twl_threshold: f64,

    #[serde(default)]
    pub mhhw: f64,

    #[serde(default)]
    pub include_tide_only: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClusterDto {
    pub name: String,

    #[serde(default = "default_run_condition")]
    pub run_condition: String,

    #[serde(default = "default_topn")]
    pub topn: usize,

    #[serde(default = "default_hm0_fraction")]
    pub hm0_fraction: f64,

    #[serde(default)]
    pub boundary_twl_margin: f64,

    #[serde(default = "default_use_threshold")]
    pub use_threshold: bool,

    pub models: Vec<String>,
}

fn default_priority() -> i32 {
    10
}

fn default_boundary_twl_threshold() -> f64 {
    -999.0
}

fn default_run_condition() -> String {
    "topn".to_string()
}

fn default_topn() -> usize {
    10
}

fn default_hm0_fraction() -> f64 {
    0.2
}

fn default_use_threshold() -> bool {
    true
}
