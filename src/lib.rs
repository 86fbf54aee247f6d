use std::path::{Path, PathBuf};

use crate::api::config_dto::RunConfigDto;
use crate::api::scenario_dto::ScenarioDto;
use crate::domain::clock::clock::SharedClock;
use crate::domain::clock::ticker::Ticker;
use crate::domain::config::RunConfig;
use crate::domain::scheduler::cycle_scheduler::CycleScheduler;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

pub const SCENARIO_FILE: &str = "scenario.json";

pub fn load_run_config(file_path: &Path) -> Result<RunConfig> {
    let dto: RunConfigDto = parse_json_file(file_path)?;
    log::info!("Run configuration {} parsed successfully.", file_path.display());

    RunConfig::try_from(dto)
}

/// Path of the scenario description, `<main_path>/scenarios/<name>/scenario.json`.
pub fn scenario_file(config: &RunConfig, scenario_name: &str) -> PathBuf {
    config.main_path.join("scenarios").join(scenario_name).join(SCENARIO_FILE)
}

pub fn load_scenario(config: &RunConfig, scenario_name: &str) -> Result<ScenarioDto> {
    let path = scenario_file(config, scenario_name);
    let dto: ScenarioDto = parse_json_file(&path)?;
    log::info!("Scenario {} with {} model(s) parsed successfully.", dto.name, dto.models.len());

    Ok(dto)
}

/// Wires the cycle scheduler with the execution backend of the configured run mode and the
/// built-in model kinds, boundary provider and restart lookup.
pub fn build_cycle_scheduler(config: RunConfig, scenario: ScenarioDto, clock: SharedClock, ticker: Box<dyn Ticker>) -> Result<CycleScheduler> {
    let backend = config.run_mode.get_instance(&config)?;
    log::info!("Using the {} execution backend.", backend.run_mode());

    Ok(CycleScheduler::new(config, scenario, backend, clock, ticker))
}
