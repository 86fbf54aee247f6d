use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::api::job_dto::{JobConfigDto, NestingDto, TimeWindowDto};
use crate::domain::backend::execution_backend_trait::JobSpec;
use crate::domain::model::model::{BoundaryKind, Model, ModelRole, PerKind, TimeWindow};
use crate::domain::model::model_kind_trait::NestingSource;
use crate::domain::model::model_type::ModelType;
use crate::domain::time_window::restart_lookup::parse_restart_time;
use crate::domain::utils::file_ops::{copy_dir_contents, move_file, remove_dir_if_exists};
use crate::error::{Error, Result};

pub const JOB_CONFIG_FILE: &str = "job.json";
pub const DEFAULT_RUN_SCRIPT: &str = "run.sh";

/// Files produced by the backends themselves, never archived.
const BOOKKEEPING_FILES: [&str; 3] = [JOB_CONFIG_FILE, "ready.json", "finished.txt"];

/// Shared workspace handling of all model kinds.
#[derive(Debug, Clone)]
pub struct ModelKindBase {
    pub model_type: ModelType,
    pub run_script: &'static str,
    /// File name prefix of restart files written by the engine, per boundary kind.
    pub restart_prefix: PerKind<Option<&'static str>>,
    /// Output files with these extensions are copied to the timeseries folder.
    pub timeseries_extensions: &'static [&'static str],
}

impl ModelKindBase {
    pub fn new(model_type: ModelType) -> Self {
        ModelKindBase {
            model_type,
            run_script: DEFAULT_RUN_SCRIPT,
            restart_prefix: PerKind::default(),
            timeseries_extensions: &["csv"],
        }
    }

    pub fn with_restart_prefix(mut self, kind: BoundaryKind, prefix: &'static str) -> Self {
        *self.restart_prefix.get_mut(kind) = Some(prefix);
        self
    }

    pub fn with_timeseries_extensions(mut self, extensions: &'static [&'static str]) -> Self {
        self.timeseries_extensions = extensions;
        self
    }

    /// Recreates the job folder from the static model input, adds restart files and
    /// writes the job description.
    pub fn prepare_workspace(&self, model: &Model, nesting: &[NestingSource<'_>], cycle: &str) -> Result<()> {
        let job = &model.paths.job;

        remove_dir_if_exists(job)?;
        fs::create_dir_all(job)?;
        model.paths.create_cycle_dirs()?;

        let copied = copy_dir_contents(&model.paths.static_input, job)?;
        log::debug!("Copied {} input files of model {} into {}.", copied, model.id, job.display());

        for kind in BoundaryKind::TIMED {
            let restart = model.windows.get(kind).as_ref().and_then(|w| w.restart.as_ref());
            if let Some(restart) = restart {
                if let Some(name) = restart.path.file_name() {
                    fs::copy(&restart.path, job.join(name))?;
                }
            }
        }

        let job_config = JobConfigDto {
            model: model.id.to_string(),
            model_type: model.model_type.to_string(),
            cycle: cycle.to_string(),
            tide_only: model.role == ModelRole::TideOnly,
            meteo_forcing: model.meteo_forcing,
            flow: model.windows.flow.as_ref().filter(|_| model.flow).map(window_dto),
            wave: model.windows.wave.as_ref().filter(|_| model.wave).map(window_dto),
            nesting: nesting
                .iter()
                .map(|source| NestingDto {
                    kind: source.kind.to_string(),
                    parent: source.parent.id.to_string(),
                    output_path: source.parent.paths.cycle_output.display().to_string(),
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&job_config)?;
        fs::write(job.join(JOB_CONFIG_FILE), json)?;

        Ok(())
    }

    /// Moves restart files into the restart archive, static inputs into the cycle input
    /// folder and results into the cycle output folder, then removes the job folder.
    pub fn move_output(&self, model: &Model) -> Result<()> {
        let job = &model.paths.job;
        if !job.is_dir() {
            return Ok(());
        }

        for entry in fs::read_dir(job)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();

            if BOOKKEEPING_FILES.contains(&name.as_str()) || name == self.run_script {
                continue;
            }

            if entry.file_type()?.is_dir() {
                copy_dir_contents(&entry.path(), &model.paths.cycle_output.join(&name))?;
                continue;
            }

            let target = match self.restart_kind_of(&name).and_then(|kind| model.paths.restart_dir(kind)) {
                Some(dir) => dir.join(&name),
                None if model.paths.static_input.join(&name).exists() => model.paths.cycle_input.join(&name),
                None => model.paths.cycle_output.join(&name),
            };
            move_file(&entry.path(), &target)?;
        }

        remove_dir_if_exists(job)?;
        Ok(())
    }

    /// Copies timeseries outputs into the timeseries folder. A model without any output
    /// is reported as a post-processing failure.
    pub fn collect_timeseries(&self, model: &Model) -> Result<()> {
        let output = &model.paths.cycle_output;
        let entries: Vec<_> = match fs::read_dir(output) {
            Ok(entries) => entries.filter_map(|e| e.ok()).collect(),
            Err(e) => {
                return Err(Error::PostProcessError { model: model.id.to_string(), reason: format!("{}: {}", output.display(), e) });
            }
        };

        if entries.is_empty() {
            return Err(Error::PostProcessError { model: model.id.to_string(), reason: "simulation produced no output".to_string() });
        }

        fs::create_dir_all(&model.paths.cycle_timeseries)?;
        for entry in entries {
            let path = entry.path();
            if self.is_timeseries(&path) {
                if let Some(name) = path.file_name() {
                    fs::copy(&path, model.paths.cycle_timeseries.join(name))?;
                }
            }
        }

        Ok(())
    }

    pub fn job_spec(&self, model: &Model, cycle: &str) -> JobSpec {
        let mut parameters = BTreeMap::new();
        parameters.insert("model".to_string(), model.id.to_string());
        parameters.insert("type".to_string(), model.model_type.to_string());
        parameters.insert("cycle".to_string(), cycle.to_string());
        parameters.insert("run_script".to_string(), self.run_script.to_string());
        parameters.insert("ensemble".to_string(), model.ensemble.to_string());

        JobSpec {
            model: model.id.clone(),
            model_type: model.model_type,
            job_path: model.paths.job.clone(),
            run_script: self.run_script.to_string(),
            ensemble: model.ensemble,
            parameters,
        }
    }

    fn restart_kind_of(&self, file_name: &str) -> Option<BoundaryKind> {
        BoundaryKind::TIMED.into_iter().find(|kind| match self.restart_prefix.get(*kind) {
            Some(prefix) => file_name.starts_with(prefix) && parse_restart_time(file_name).is_some(),
            None => false,
        })
    }

    fn is_timeseries(&self, path: &Path) -> bool {
        path.extension().and_then(|ext| ext.to_str()).map(|ext| self.timeseries_extensions.contains(&ext)).unwrap_or(false)
    }
}

fn window_dto(window: &TimeWindow) -> TimeWindowDto {
    TimeWindowDto {
        start: window.start,
        stop: window.stop,
        restart_file: window.restart.as_ref().and_then(|r| r.path.file_name()).map(|name| name.to_string_lossy().to_string()),
    }
}
