use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::api::scenario_dto::ClusterDto;
use crate::domain::model::model_store::{ModelKey, ModelStore};
use crate::domain::utils::id::{ClusterId, ModelId};
use crate::error::{ConversionError, Error};

/// Admission policy of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunCondition {
    /// Run the N members with the highest boundary water level above their threshold.
    TopN,
    /// Run a member only if its boundary water level exceeds its threshold.
    Threshold,
    /// Like `Threshold`, but deterministic members always run.
    EnsembleThreshold,
}

impl fmt::Display for RunCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunCondition::TopN => write!(f, "topn"),
            RunCondition::Threshold => write!(f, "threshold"),
            RunCondition::EnsembleThreshold => write!(f, "ensemble_threshold"),
        }
    }
}

impl FromStr for RunCondition {
    type Err = ConversionError;

    fn from_str(run_condition: &str) -> Result<RunCondition, Self::Err> {
        match run_condition.to_lowercase().as_str() {
            "topn" => Ok(RunCondition::TopN),
            "threshold" => Ok(RunCondition::Threshold),
            "ensemble_threshold" => Ok(RunCondition::EnsembleThreshold),
            _ => Err(ConversionError::UnknownRunCondition(run_condition.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: ClusterId,
    pub run_condition: RunCondition,
    pub topn: usize,
    /// Fraction of the significant wave height added to the water level.
    pub hm0_fraction: f64,
    pub boundary_twl_margin: f64,
    pub use_threshold: bool,
    pub members: Vec<ModelKey>,
    pub ready: bool,
    /// Members whose admission has already been decided.
    pub evaluated: HashSet<ModelKey>,
}

impl Cluster {
    pub fn new(id: impl Into<String>, run_condition: RunCondition, members: Vec<ModelKey>) -> Self {
        Cluster {
            id: ClusterId::new(id),
            run_condition,
            topn: 10,
            hm0_fraction: 0.2,
            boundary_twl_margin: 0.0,
            use_threshold: true,
            members,
            ready: false,
            evaluated: HashSet::new(),
        }
    }

    /// Whether `member` may be admitted to run.
    pub fn admits(&self, member: ModelKey) -> bool {
        self.ready || (self.run_condition != RunCondition::TopN && self.evaluated.contains(&member))
    }

    pub fn contains(&self, key: ModelKey) -> bool {
        self.members.contains(&key)
    }
}

impl TryFrom<(ClusterDto, &ModelStore)> for Cluster {
    type Error = Error;

    fn try_from(args: (ClusterDto, &ModelStore)) -> Result<Self, Self::Error> {
        let (dto, store) = args;
        let run_condition = RunCondition::from_str(&dto.run_condition)?;

        let mut members = Vec::new();
        for name in &dto.models {
            let key = store.key_of(&ModelId::new(name.as_str())).ok_or_else(|| {
                Error::ConfigurationError(format!("Cluster {} contains unknown model {}.", dto.name, name))
            })?;
            if !members.contains(&key) {
                members.push(key);
            }
        }

        let mut cluster = Cluster::new(dto.name, run_condition, members);
        cluster.topn = dto.topn;
        cluster.hm0_fraction = dto.hm0_fraction;
        cluster.boundary_twl_margin = dto.boundary_twl_margin;
        cluster.use_threshold = dto.use_threshold;
        Ok(cluster)
    }
}
