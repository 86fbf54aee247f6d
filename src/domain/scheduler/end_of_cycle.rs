use chrono::{DateTime, Utc};
use std::fs;

use crate::api::cycle_info_dto::{CycleInfoDto, ModelInfoDto};
use crate::domain::backend::run_mode::RunMode;
use crate::domain::config::RunConfig;
use crate::domain::model::model::{Model, ModelRole, TimeWindow};
use crate::domain::scheduler::cycle_context::CycleContext;
use crate::domain::utils::file_ops::remove_dir_if_exists;
use crate::domain::utils::statistics::{write_events, StatParameter, StatisticEvent};
use crate::error::{Error, Result};

pub const CYCLE_INFO_FILE: &str = "cycle_info.json";
pub const STATISTICS_FILE: &str = "statistics.csv";

/// Runs once after every model of a cycle reached a terminal status.
///
/// Actions run in order and are isolated from each other: a failing action is logged
/// and never keeps the next cycle from starting.
pub trait EndOfCycleAction: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, ctx: &CycleContext) -> Result<()>;
}

/// Actions every run gets, derived from the run configuration.
pub fn standard_actions(config: &RunConfig) -> Vec<Box<dyn EndOfCycleAction>> {
    let mut actions: Vec<Box<dyn EndOfCycleAction>> = vec![Box::new(CycleInfoWriter)];

    if config.write_statistics {
        actions.push(Box::new(StatisticsWriter));
    }
    if config.clean_up || config.run_mode == RunMode::Serial {
        actions.push(Box::new(CleanUp));
    }

    actions
}

/// Removes the job folders of the scenario.
#[derive(Debug, Clone, Default)]
pub struct CleanUp;

impl EndOfCycleAction for CleanUp {
    fn name(&self) -> &str {
        "clean_up"
    }

    fn run(&self, ctx: &CycleContext) -> Result<()> {
        remove_dir_if_exists(&ctx.paths.jobs_path)?;
        log::info!("Removed job folder {}.", ctx.paths.jobs_path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CycleInfoWriter;

impl CycleInfoWriter {
    pub fn info(ctx: &CycleContext) -> Result<CycleInfoDto> {
        let finished_at: DateTime<Utc> = ctx.finished_at.ok_or_else(|| Error::EndOfCycleError {
            action: "cycle_info".to_string(),
            reason: format!("cycle {} has not finished", ctx.cycle.cycle_string),
        })?;

        Ok(CycleInfoDto {
            scenario: ctx.scenario.id.to_string(),
            cycle: ctx.cycle.cycle_string.clone(),
            start_time: ctx.cycle.time,
            stop_time: ctx.cycle.stop,
            reference_date: ctx.reference_date,
            started_at: ctx.started_at,
            finished_at,
            duration_s: (finished_at - ctx.started_at).num_seconds(),
            models: ctx
                .scenario
                .models
                .iter()
                .map(|(_, model)| ModelInfoDto {
                    name: model.id.to_string(),
                    long_name: model.long_name.clone(),
                    model_type: model.model_type.to_string(),
                    status: model.status.to_string(),
                    executed_by: model.executed_by.clone(),
                })
                .collect(),
            removed: ctx.removed.iter().map(|id| id.to_string()).collect(),
        })
    }
}

impl EndOfCycleAction for CycleInfoWriter {
    fn name(&self) -> &str {
        "cycle_info"
    }

    fn run(&self, ctx: &CycleContext) -> Result<()> {
        let info = CycleInfoWriter::info(ctx)?;
        fs::create_dir_all(&ctx.paths.cycle_path)?;
        fs::write(ctx.paths.cycle_path.join(CYCLE_INFO_FILE), serde_json::to_string_pretty(&info)?)?;
        Ok(())
    }
}

/// Writes one CSV row per model of the cycle.
#[derive(Debug, Clone, Default)]
pub struct StatisticsWriter;

impl StatisticsWriter {
    pub fn events(ctx: &CycleContext) -> Vec<StatisticEvent> {
        ctx.scenario.models.iter().map(|(_, model)| model_event(ctx, model)).collect()
    }
}

impl EndOfCycleAction for StatisticsWriter {
    fn name(&self) -> &str {
        "statistics"
    }

    fn run(&self, ctx: &CycleContext) -> Result<()> {
        fs::create_dir_all(&ctx.paths.cycle_path)?;
        write_events(&ctx.paths.cycle_path.join(STATISTICS_FILE), &StatisticsWriter::events(ctx))
    }
}

fn model_event(ctx: &CycleContext, model: &Model) -> StatisticEvent {
    let mut event = StatisticEvent::new();
    event
        .set(StatParameter::Cycle, ctx.cycle.cycle_string.as_str())
        .set(StatParameter::Scenario, ctx.scenario.id.as_str())
        .set(StatParameter::ModelName, model.id.as_str())
        .set(StatParameter::ModelType, model.model_type.as_str())
        .set(
            StatParameter::Role,
            match model.role {
                ModelRole::Deterministic => "deterministic",
                ModelRole::TideOnly => "tide_only",
            },
        )
        .set(StatParameter::Status, model.status.as_str())
        .set(StatParameter::Priority, model.priority);

    if let Some(window) = &model.windows.flow {
        set_window(&mut event, window, StatParameter::FlowStart, StatParameter::FlowStop, StatParameter::FlowRestart);
    }
    if let Some(window) = &model.windows.wave {
        set_window(&mut event, window, StatParameter::WaveStart, StatParameter::WaveStop, StatParameter::WaveRestart);
    }
    if let Some(peak) = model.peak_boundary {
        event.set(StatParameter::PeakBoundary, peak.value);
    }
    if let Some(worker) = &model.executed_by {
        event.set(StatParameter::ExecutedBy, worker.as_str());
    }

    event
}

fn set_window(event: &mut StatisticEvent, window: &TimeWindow, start: StatParameter, stop: StatParameter, restart: StatParameter) {
    event.set(start, window.start.to_rfc3339()).set(stop, window.stop.to_rfc3339());
    if let Some(file) = &window.restart {
        event.set(restart, file.path.display().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::model::{ModelStatus, RestartFile};
    use crate::domain::model::model_type::ModelType;
    use crate::domain::scenario::cycle_paths::CyclePaths;
    use crate::domain::scenario::scenario::Scenario;
    use crate::domain::scheduler::cycle::Cycle;
    use crate::domain::model::model_store::ModelStore;
    use chrono::{TimeDelta, TimeZone};
    use std::path::PathBuf;

    fn context(root: &std::path::Path) -> CycleContext {
        let cycle_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut models = ModelStore::new();

        let mut sf = Model::new("sf", ModelType::Sfincs);
        sf.status = ModelStatus::Finished;
        sf.executed_by = Some("node-1".to_string());
        let mut window = TimeWindow::new(cycle_time - TimeDelta::hours(6), cycle_time + TimeDelta::hours(48));
        window.restart = Some(RestartFile { time: cycle_time - TimeDelta::hours(6), path: PathBuf::from("sfincs.20231231.180000.rst") });
        sf.windows.flow = Some(window);
        models.add(sf);

        let mut hw = Model::new("hw", ModelType::HurryWave);
        hw.status = ModelStatus::Failed;
        models.add(hw);

        let scenario = Scenario {
            id: "storm".into(),
            long_name: "Storm".to_string(),
            runtime: TimeDelta::hours(48),
            cycle: None,
            last_cycle: None,
            models,
            clusters: Vec::new(),
        };

        let mut ctx = CycleContext::new(
            Cycle::new(cycle_time, scenario.runtime, None),
            scenario,
            CyclePaths::new(root, "storm", cycle_time),
            cycle_time,
        );
        ctx.finished_at = Some(cycle_time + TimeDelta::minutes(90));
        ctx
    }

    #[test]
    fn test_cycle_info_and_statistics() {
        let root = std::env::temp_dir().join(format!("end_of_cycle_{}", uuid::Uuid::new_v4()));
        let ctx = context(&root);

        CycleInfoWriter.run(&ctx).unwrap();
        let info: CycleInfoDto = serde_json::from_str(&fs::read_to_string(ctx.paths.cycle_path.join(CYCLE_INFO_FILE)).unwrap()).unwrap();
        assert_eq!(info.cycle, "20240101_00z");
        assert_eq!(info.duration_s, 5400);
        assert_eq!(info.models.len(), 2);
        assert_eq!(info.models[0].executed_by.as_deref(), Some("node-1"));
        assert_eq!(info.models[1].status, "failed");

        StatisticsWriter.run(&ctx).unwrap();
        let csv = fs::read_to_string(ctx.paths.cycle_path.join(STATISTICS_FILE)).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].contains("sfincs.20231231.180000.rst"));
        assert!(rows[1].ends_with("node-1"));
        assert!(rows[2].contains(";failed;"));

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_clean_up_removes_job_folder() {
        let root = std::env::temp_dir().join(format!("end_of_cycle_{}", uuid::Uuid::new_v4()));
        let ctx = context(&root);
        fs::create_dir_all(ctx.paths.jobs_path.join("sf")).unwrap();

        CleanUp.run(&ctx).unwrap();
        assert!(!ctx.paths.jobs_path.exists());

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_cycle_info_requires_finished_cycle() {
        let root = std::env::temp_dir().join(format!("end_of_cycle_{}", uuid::Uuid::new_v4()));
        let mut ctx = context(&root);
        ctx.finished_at = None;

        assert!(matches!(CycleInfoWriter.run(&ctx), Err(Error::EndOfCycleError { .. })));
    }
}
