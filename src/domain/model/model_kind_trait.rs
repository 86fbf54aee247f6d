use crate::domain::backend::execution_backend_trait::JobSpec;
use crate::domain::model::model::{BoundaryKind, Model};
use crate::domain::model::model_kind_base::ModelKindBase;
use crate::domain::model::model_type::ModelType;
use crate::error::Result;

/// A parent model a job takes boundary data from.
#[derive(Debug, Clone, Copy)]
pub struct NestingSource<'a> {
    pub kind: BoundaryKind,
    pub parent: &'a Model,
}

/// Lifecycle hooks of one model type, called by the job scheduler at fixed points:
/// `pre_process` before submission, `move_output` once the job is done and
/// `post_process` after all moves of the tick.
pub trait ModelKind: std::fmt::Debug + Send + Sync {
    fn get_base(&self) -> &ModelKindBase;

    fn model_type(&self) -> ModelType {
        self.get_base().model_type
    }

    fn pre_process(&self, model: &Model, nesting: &[NestingSource<'_>], cycle: &str) -> Result<()> {
        self.get_base().prepare_workspace(model, nesting, cycle)
    }

    fn move_output(&self, model: &Model) -> Result<()> {
        self.get_base().move_output(model)
    }

    fn post_process(&self, model: &Model) -> Result<()> {
        self.get_base().collect_timeseries(model)
    }

    fn job_spec(&self, model: &Model, cycle: &str) -> JobSpec {
        self.get_base().job_spec(model, cycle)
    }
}
