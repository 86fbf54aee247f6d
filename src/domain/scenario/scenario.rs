use chrono::{DateTime, TimeDelta, Utc};
use std::fs;

use crate::api::scenario_dto::ScenarioDto;
use crate::domain::cluster::cluster::Cluster;
use crate::domain::model::model::{Model, ModelStatus};
use crate::domain::model::model_store::{ModelKey, ModelStore};
use crate::domain::scenario::cycle_paths::CyclePaths;
use crate::domain::scenario::nesting;
use crate::domain::utils::id::{ClusterId, ScenarioId};
use crate::domain::utils::time::{hours, parse_cycle_string};
use crate::error::{Error, Result};

/// The model set and clusters of one cycle.
///
/// A fresh scenario is built from its description for every cycle; the job scheduler
/// owns it for the duration of that cycle.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: ScenarioId,
    pub long_name: String,
    pub runtime: TimeDelta,
    pub cycle: Option<DateTime<Utc>>,
    pub last_cycle: Option<DateTime<Utc>>,
    pub models: ModelStore,
    pub clusters: Vec<Cluster>,
}

impl Scenario {
    /// Points every model at its folders of the given cycle.
    pub fn assign_paths(&mut self, paths: &CyclePaths) {
        for key in self.models.keys() {
            if let Some(model) = self.models.get_mut(key) {
                model.paths = paths.model_paths(&model.id, model.model_type);
            }
        }
    }

    /// Marks models that already have a job list sentinel as finished, so that an
    /// interrupted cycle resumes where it stopped.
    ///
    /// # Returns
    /// Number of models marked as finished.
    pub fn resume_from_job_list(&mut self, paths: &CyclePaths) -> usize {
        let mut resumed = 0;

        for key in self.models.keys() {
            let Some(model) = self.models.get_mut(key) else {
                continue;
            };

            let sentinel = paths.job_list_sentinel(&model.id);
            if let Ok(content) = fs::read_to_string(&sentinel) {
                model.set_status(ModelStatus::Finished);
                model.executed_by = content.trim().strip_prefix("finished by ").map(|worker| worker.trim().to_string());
                log::info!("Model {} already finished in a previous run of this cycle.", model.id);
                resumed += 1;
            }
        }

        resumed
    }

    pub fn cluster_of(&self, key: ModelKey) -> Option<&Cluster> {
        let cluster_id = self.models.get(key)?.cluster.as_ref()?;
        self.clusters.iter().find(|cluster| &cluster.id == cluster_id)
    }

    pub fn all_terminal(&self) -> bool {
        self.models.iter().all(|(_, model)| model.status.is_terminal())
    }
}

impl TryFrom<ScenarioDto> for Scenario {
    type Error = Error;

    fn try_from(dto: ScenarioDto) -> Result<Self> {
        if !(dto.runtime_hours > 0.0) {
            return Err(Error::ConfigurationError(format!("Scenario {} needs a positive runtime.", dto.name)));
        }

        let cycle = dto.cycle.as_deref().map(parse_cycle_string).transpose()?;
        let last_cycle = dto.last_cycle.as_deref().map(parse_cycle_string).transpose()?;

        let mut models = ModelStore::new();
        let mut tide_only = Vec::new();

        for model_dto in dto.models {
            let model = Model::try_from(model_dto)?;
            if model.include_tide_only && model.flow && !model.wave {
                log::info!("Adding tide only forcing to model {}.", model.id);
                tide_only.push(model.tide_only_copy());
            }

            let id = model.id.clone();
            if models.add(model).is_none() {
                return Err(Error::ConfigurationError(format!("Model {} is defined twice in scenario {}.", id, dto.name)));
            }
        }

        for copy in tide_only {
            let id = copy.id.clone();
            if models.add(copy).is_none() {
                return Err(Error::ConfigurationError(format!("Tide-only copy {} clashes with an existing model.", id)));
            }
        }

        nesting::link(&mut models)?;

        let mut clusters = Vec::new();
        for cluster_dto in dto.clusters {
            let cluster = Cluster::try_from((cluster_dto, &models))?;
            if clusters.iter().any(|c: &Cluster| c.id == cluster.id) {
                return Err(Error::ConfigurationError(format!("Cluster {} is defined twice.", cluster.id)));
            }
            clusters.push(cluster);
        }

        // Membership can be given on either side.
        for key in models.keys() {
            let Some(model) = models.get_mut(key) else {
                continue;
            };

            let listed_in: Vec<ClusterId> = clusters.iter().filter(|c| c.contains(key)).map(|c| c.id.clone()).collect();
            match (model.cluster.clone(), listed_in.as_slice()) {
                (_, [a, b, ..]) => {
                    return Err(Error::ConfigurationError(format!("Model {} belongs to clusters {} and {}.", model.id, a, b)));
                }
                (Some(declared), [listed]) if &declared != listed => {
                    return Err(Error::ConfigurationError(format!(
                        "Model {} declares cluster {} but is listed in cluster {}.",
                        model.id, declared, listed
                    )));
                }
                (None, [listed]) => model.cluster = Some(listed.clone()),
                (Some(declared), []) => {
                    let cluster = clusters.iter_mut().find(|c| c.id == declared).ok_or_else(|| {
                        Error::ConfigurationError(format!("Model {} declares unknown cluster {}.", model.id, declared))
                    })?;
                    cluster.members.push(key);
                }
                _ => {}
            }
        }

        Ok(Scenario {
            id: ScenarioId::new(dto.name.clone()),
            long_name: dto.long_name.unwrap_or(dto.name),
            runtime: hours(dto.runtime_hours),
            cycle,
            last_cycle,
            models,
            clusters,
        })
    }
}
