use chrono::{DateTime, Utc};

use crate::domain::model::model::ModelStatus;
use crate::domain::scenario::cycle_paths::CyclePaths;
use crate::domain::scenario::scenario::Scenario;
use crate::domain::scheduler::cycle::Cycle;
use crate::domain::utils::id::ModelId;

/// State of one cycle, created by the cycle scheduler and handed to the job scheduler
/// and the end-of-cycle actions by reference.
#[derive(Debug)]
pub struct CycleContext {
    pub cycle: Cycle,
    pub scenario: Scenario,
    pub paths: CyclePaths,
    /// Earliest model start floored to midnight, aligns forcing lookups.
    pub reference_date: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Models dropped by cluster admission.
    pub removed: Vec<ModelId>,
    pub ticks: usize,
    pub completed: bool,
}

impl CycleContext {
    pub fn new(cycle: Cycle, scenario: Scenario, paths: CyclePaths, started_at: DateTime<Utc>) -> Self {
        CycleContext {
            cycle,
            scenario,
            paths,
            reference_date: None,
            started_at,
            finished_at: None,
            removed: Vec::new(),
            ticks: 0,
            completed: false,
        }
    }
}

/// What a finished cycle leaves behind for the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSummary {
    pub cycle_string: String,
    pub next: Option<DateTime<Utc>>,
    pub statuses: Vec<(String, ModelStatus)>,
    pub removed: Vec<String>,
    pub ticks: usize,
}

impl CycleSummary {
    pub fn status_of(&self, model: &str) -> Option<ModelStatus> {
        self.statuses.iter().find(|(name, _)| name == model).map(|(_, status)| *status)
    }
}

impl From<&CycleContext> for CycleSummary {
    fn from(ctx: &CycleContext) -> Self {
        CycleSummary {
            cycle_string: ctx.cycle.cycle_string.clone(),
            next: ctx.cycle.next,
            statuses: ctx.scenario.models.iter().map(|(_, model)| (model.id.to_string(), model.status)).collect(),
            removed: ctx.removed.iter().map(|id| id.to_string()).collect(),
            ticks: ctx.ticks,
        }
    }
}
