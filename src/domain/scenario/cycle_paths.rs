use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::model::model::BoundaryKind;
use crate::domain::model::model_type::ModelType;
use crate::domain::utils::id::ModelId;
use crate::domain::utils::time::format_cycle_string;
use crate::error::Result;

/// Directory layout of one cycle of a scenario.
///
/// ```text
/// <main>/models/<type>/<name>/input          static model input
/// <main>/jobs/<scenario>/<name>              job workspace
/// <main>/scenarios/<scenario>/restart/<name>/{flow,wave}
/// <main>/scenarios/<scenario>/<cycle>/models/<name>/{input,output,figures,timeseries}
/// <main>/scenarios/<scenario>/<cycle>/job_list/<name>.finished
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePaths {
    pub main_path: PathBuf,
    pub cycle_string: String,
    pub scenario_path: PathBuf,
    pub cycle_path: PathBuf,
    pub cycle_models_path: PathBuf,
    pub job_list_path: PathBuf,
    pub restart_path: PathBuf,
    pub jobs_path: PathBuf,
}

impl CyclePaths {
    pub fn new(main_path: &Path, scenario_name: &str, cycle: DateTime<Utc>) -> Self {
        let cycle_string = format_cycle_string(cycle);
        let scenario_path = main_path.join("scenarios").join(scenario_name);
        let cycle_path = scenario_path.join(&cycle_string);

        CyclePaths {
            main_path: main_path.to_path_buf(),
            cycle_models_path: cycle_path.join("models"),
            job_list_path: cycle_path.join("job_list"),
            restart_path: scenario_path.join("restart"),
            jobs_path: main_path.join("jobs").join(scenario_name),
            cycle_string,
            scenario_path,
            cycle_path,
        }
    }

    pub fn model_paths(&self, id: &ModelId, model_type: ModelType) -> ModelPaths {
        let name = id.as_str();
        let cycle_model = self.cycle_models_path.join(name);
        let restart = self.restart_path.join(name);

        ModelPaths {
            static_input: self.main_path.join("models").join(model_type.as_str()).join(name).join("input"),
            job: self.jobs_path.join(name),
            cycle_input: cycle_model.join("input"),
            cycle_output: cycle_model.join("output"),
            cycle_figures: cycle_model.join("figures"),
            cycle_timeseries: cycle_model.join("timeseries"),
            cycle: cycle_model,
            restart_flow: restart.join("flow"),
            restart_wave: restart.join("wave"),
        }
    }

    pub fn job_list_sentinel(&self, id: &ModelId) -> PathBuf {
        self.job_list_path.join(format!("{}.finished", id))
    }

    /// Creates the cycle level folders. Model folders are created when a model is pre-processed.
    pub fn create_dirs(&self) -> Result<()> {
        for path in [&self.cycle_path, &self.cycle_models_path, &self.job_list_path, &self.restart_path, &self.jobs_path] {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelPaths {
    pub static_input: PathBuf,
    pub job: PathBuf,
    pub cycle: PathBuf,
    pub cycle_input: PathBuf,
    pub cycle_output: PathBuf,
    pub cycle_figures: PathBuf,
    pub cycle_timeseries: PathBuf,
    pub restart_flow: PathBuf,
    pub restart_wave: PathBuf,
}

impl ModelPaths {
    pub fn restart_dir(&self, kind: BoundaryKind) -> Option<&Path> {
        match kind {
            BoundaryKind::Flow => Some(&self.restart_flow),
            BoundaryKind::Wave => Some(&self.restart_wave),
            BoundaryKind::Bw => None,
        }
    }

    pub fn create_cycle_dirs(&self) -> Result<()> {
        for path in [
            &self.cycle_input,
            &self.cycle_output,
            &self.cycle_figures,
            &self.cycle_timeseries,
            &self.restart_flow,
            &self.restart_wave,
        ] {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_layout() {
        let cycle = Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap();
        let paths = CyclePaths::new(Path::new("/run"), "gulf", cycle);

        assert_eq!(paths.cycle_path, PathBuf::from("/run/scenarios/gulf/20240101_06z"));
        assert_eq!(paths.job_list_sentinel(&ModelId::new("sf")), PathBuf::from("/run/scenarios/gulf/20240101_06z/job_list/sf.finished"));

        let model = paths.model_paths(&ModelId::new("sf"), ModelType::Sfincs);
        assert_eq!(model.static_input, PathBuf::from("/run/models/sfincs/sf/input"));
        assert_eq!(model.job, PathBuf::from("/run/jobs/gulf/sf"));
        assert_eq!(model.cycle_output, PathBuf::from("/run/scenarios/gulf/20240101_06z/models/sf/output"));
        assert_eq!(model.restart_dir(BoundaryKind::Wave), Some(Path::new("/run/scenarios/gulf/restart/sf/wave")));
        assert_eq!(model.restart_dir(BoundaryKind::Bw), None);
    }
}
