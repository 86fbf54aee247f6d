use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::backend::run_mode::RunMode;
use crate::domain::model::model::Model;
use crate::domain::model::model_type::ModelType;
use crate::domain::utils::id::ModelId;
use crate::error::Result;

/// How many jobs the job scheduler may have in flight on a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyPolicy {
    /// At most one running model, at most one admission per tick.
    OneAtATime,
    /// All admissible models of the highest waiting priority.
    TopPriorityTier,
    /// No local cap.
    Unbounded,
}

/// Where a submitted job can be observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobLocator {
    /// A job folder in which the completion sentinel appears.
    Workspace(PathBuf),
    /// A workflow object on the workflow server.
    Workflow { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub model: ModelId,
    pub run_mode: RunMode,
    pub locator: JobLocator,
}

/// Everything a backend needs to start the job of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub model: ModelId,
    pub model_type: ModelType,
    pub job_path: PathBuf,
    pub run_script: String,
    pub ensemble: bool,
    /// Named parameters passed to templated backends.
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPoll {
    Running,
    /// The job is done. `worker` names who executed it, when the backend knows.
    Done { worker: Option<String> },
}

impl JobPoll {
    pub fn is_done(&self) -> bool {
        matches!(self, JobPoll::Done { .. })
    }
}

/// Submits prepared jobs and reports their status.
///
/// Backends must be side-effect free on `poll`: the job scheduler polls every running
/// model on every tick until it is reported done.
#[async_trait]
pub trait ExecutionBackend: std::fmt::Debug + Send + Sync {
    fn run_mode(&self) -> RunMode;

    fn concurrency(&self) -> ConcurrencyPolicy {
        self.run_mode().concurrency()
    }

    async fn submit(&self, model: &Model, spec: &JobSpec) -> Result<JobHandle>;

    async fn poll(&self, handle: &JobHandle) -> Result<JobPoll>;
}
