use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::api::scenario_dto::ModelDto;
use crate::domain::backend::execution_backend_trait::JobHandle;
use crate::domain::model::model_store::ModelKey;
use crate::domain::model::model_type::ModelType;
use crate::domain::scenario::cycle_paths::ModelPaths;
use crate::domain::utils::id::{ClusterId, ModelId};
use crate::domain::utils::time::hours;
use crate::error::Error;

/// The kinds of boundary data a model can receive from a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoundaryKind {
    Flow,
    Wave,
    /// Combined beach/wave forcing, only used for nesting.
    Bw,
}

impl BoundaryKind {
    pub const ALL: [BoundaryKind; 3] = [BoundaryKind::Flow, BoundaryKind::Wave, BoundaryKind::Bw];

    /// Kinds that carry a simulation time window.
    pub const TIMED: [BoundaryKind; 2] = [BoundaryKind::Flow, BoundaryKind::Wave];

    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryKind::Flow => "flow",
            BoundaryKind::Wave => "wave",
            BoundaryKind::Bw => "bw",
        }
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One value per boundary kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerKind<T> {
    pub flow: T,
    pub wave: T,
    pub bw: T,
}

impl<T> PerKind<T> {
    pub fn get(&self, kind: BoundaryKind) -> &T {
        match kind {
            BoundaryKind::Flow => &self.flow,
            BoundaryKind::Wave => &self.wave,
            BoundaryKind::Bw => &self.bw,
        }
    }

    pub fn get_mut(&mut self, kind: BoundaryKind) -> &mut T {
        match kind {
            BoundaryKind::Flow => &mut self.flow,
            BoundaryKind::Wave => &mut self.wave,
            BoundaryKind::Bw => &mut self.bw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelStatus {
    Waiting,
    Running,
    SimulationFinished,
    Finished,
    Failed,
}

impl ModelStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ModelStatus::Finished | ModelStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelStatus::Waiting => "waiting",
            ModelStatus::Running => "running",
            ModelStatus::SimulationFinished => "simulation_finished",
            ModelStatus::Finished => "finished",
            ModelStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    Deterministic,
    /// Copy of a deterministic model that runs without meteorological forcing.
    TideOnly,
}

/// A serialized model state found in the restart archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartFile {
    pub time: DateTime<Utc>,
    pub path: PathBuf,
}

/// Simulation window of one boundary kind.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub restart: Option<RestartFile>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        TimeWindow { start, stop, restart: None }
    }
}

/// Peak boundary total water level, as seen by cluster admission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakBoundary {
    pub value: f64,
    pub time: Option<DateTime<Utc>>,
}

impl PeakBoundary {
    /// Value used when the peak could not be computed.
    pub const MISSING: f64 = -999.0;

    pub fn missing() -> Self {
        PeakBoundary { value: Self::MISSING, time: None }
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    pub id: ModelId,
    pub long_name: String,
    pub model_type: ModelType,

    pub flow: bool,
    pub wave: bool,

    /// Higher runs first.
    pub priority: i32,
    pub role: ModelRole,
    pub ensemble: bool,

    /// Names of the configured parents, resolved into `parents` when the scenario is built.
    pub nested_in: PerKind<Option<ModelId>>,
    pub parents: PerKind<Option<ModelKey>>,
    pub children: PerKind<Vec<ModelKey>>,

    pub spinup: PerKind<TimeDelta>,
    pub windows: PerKind<Option<TimeWindow>>,

    pub status: ModelStatus,

    pub cluster: Option<ClusterId>,
    pub boundary_twl_threshold: f64,
    pub mhhw: f64,
    pub peak_boundary: Option<PeakBoundary>,

    pub include_tide_only: bool,
    pub meteo_forcing: bool,

    pub paths: ModelPaths,
    pub job: Option<JobHandle>,
    pub executed_by: Option<String>,
}

impl Model {
    pub fn new(name: impl Into<String>, model_type: ModelType) -> Self {
        let id = ModelId::new(name);
        let (flow, wave) = model_type.default_capabilities();

        Model {
            long_name: id.to_string(),
            id,
            model_type,
            flow,
            wave,
            priority: 10,
            role: ModelRole::Deterministic,
            ensemble: false,
            nested_in: PerKind::default(),
            parents: PerKind::default(),
            children: PerKind::default(),
            spinup: PerKind::default(),
            windows: PerKind::default(),
            status: ModelStatus::Waiting,
            cluster: None,
            boundary_twl_threshold: PeakBoundary::MISSING,
            mhhw: 0.0,
            peak_boundary: None,
            include_tide_only: false,
            meteo_forcing: true,
            paths: ModelPaths::default(),
            job: None,
            executed_by: None,
        }
    }

    pub fn has_kind(&self, kind: BoundaryKind) -> bool {
        match kind {
            BoundaryKind::Flow => self.flow,
            BoundaryKind::Wave => self.wave,
            BoundaryKind::Bw => false,
        }
    }

    pub fn parent_keys(&self) -> impl Iterator<Item = ModelKey> + '_ {
        BoundaryKind::ALL.into_iter().filter_map(|kind| *self.parents.get(kind))
    }

    /// Sets the status and reports whether it actually changed.
    pub fn set_status(&mut self, status: ModelStatus) -> bool {
        if self.status == status {
            return false;
        }

        log::debug!("Model {} changes status from {} to {}.", self.id, self.status, status);
        self.status = status;
        true
    }

    /// Copy of this model that runs on tide only, nested the same way as the original.
    pub fn tide_only_copy(&self) -> Model {
        let mut copy = self.clone();
        copy.id = ModelId::new(format!("{}_tide_only", self.id));
        copy.long_name = format!("{} (tide only)", self.long_name);
        copy.role = ModelRole::TideOnly;
        copy.meteo_forcing = false;
        copy.include_tide_only = false;
        copy.cluster = None;
        copy.parents = PerKind::default();
        copy.children = PerKind::default();
        copy
    }

    /// Earliest resolved start over all time windows.
    pub fn earliest_start(&self) -> Option<DateTime<Utc>> {
        BoundaryKind::TIMED.iter().filter_map(|kind| self.windows.get(*kind).as_ref().map(|w| w.start)).min()
    }
}

impl TryFrom<ModelDto> for Model {
    type Error = Error;

    fn try_from(dto: ModelDto) -> Result<Self, Self::Error> {
        let model_type = ModelType::from_str(&dto.typ)?;
        let mut model = Model::new(dto.name, model_type);

        if let Some(long_name) = dto.long_name {
            model.long_name = long_name;
        }
        if let Some(flow) = dto.flow {
            model.flow = flow;
        }
        if let Some(wave) = dto.wave {
            model.wave = wave;
        }
        if !model.flow && !model.wave {
            return Err(Error::ConfigurationError(format!("Model {} produces neither flow nor wave output.", model.id)));
        }

        if dto.flow_spinup_hours < 0.0 || dto.wave_spinup_hours < 0.0 {
            return Err(Error::ConfigurationError(format!("Model {} has a negative spin-up time.", model.id)));
        }

        model.priority = dto.priority;
        model.ensemble = dto.ensemble;
        model.nested_in = PerKind {
            flow: dto.flow_nested.map(ModelId::new),
            wave: dto.wave_nested.map(ModelId::new),
            bw: dto.bw_nested.map(ModelId::new),
        };
        model.spinup = PerKind {
            flow: hours(dto.flow_spinup_hours),
            wave: hours(dto.wave_spinup_hours),
            bw: TimeDelta::zero(),
        };
        model.cluster = dto.cluster.map(ClusterId::new);
        model.boundary_twl_threshold = dto.boundary_twl_threshold;
        model.mhhw = dto.mhhw;
        model.include_tide_only = dto.include_tide_only;

        Ok(model)
    }
}
