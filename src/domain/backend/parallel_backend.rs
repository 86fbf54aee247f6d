use async_trait::async_trait;
use std::fs;

use crate::api::job_dto::ReadyDescriptorDto;
use crate::domain::backend::execution_backend_trait::{ExecutionBackend, JobHandle, JobLocator, JobPoll, JobSpec};
use crate::domain::backend::run_mode::RunMode;
use crate::domain::backend::sentinel::read_finished;
use crate::domain::model::model::Model;
use crate::error::{Error, Result};

pub const READY_FILE: &str = "ready.json";

/// Hands jobs to a fleet of external workers through the shared job folder.
///
/// Submitting only drops a `ready.json` descriptor into the job workspace. A worker picks it
/// up, runs the job and writes the completion sentinel with its own name.
#[derive(Debug, Default)]
pub struct ParallelBackend;

impl ParallelBackend {
    pub fn new() -> Self {
        ParallelBackend
    }
}

#[async_trait]
impl ExecutionBackend for ParallelBackend {
    fn run_mode(&self) -> RunMode {
        RunMode::Parallel
    }

    async fn submit(&self, model: &Model, spec: &JobSpec) -> Result<JobHandle> {
        if !spec.job_path.is_dir() {
            return Err(Error::ExecutionBackendError {
                model: model.id.to_string(),
                reason: format!("job folder {} does not exist", spec.job_path.display()),
            });
        }

        let descriptor = ReadyDescriptorDto {
            job_id: uuid::Uuid::new_v4().to_string(),
            model: model.id.to_string(),
            model_type: spec.model_type.to_string(),
            run_script: spec.run_script.clone(),
            ensemble: spec.ensemble,
        };

        fs::write(spec.job_path.join(READY_FILE), serde_json::to_string_pretty(&descriptor)?)?;
        log::info!("Model {} is ready for the worker fleet (job {}).", model.id, descriptor.job_id);

        Ok(JobHandle { model: model.id.clone(), run_mode: RunMode::Parallel, locator: JobLocator::Workspace(spec.job_path.clone()) })
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobPoll> {
        match &handle.locator {
            JobLocator::Workspace(job_path) => match read_finished(job_path)? {
                Some(worker) => Ok(JobPoll::Done { worker }),
                None => Ok(JobPoll::Running),
            },
            JobLocator::Workflow { name } => Err(Error::ExecutionBackendError {
                model: handle.model.to_string(),
                reason: format!("workflow {} is not a job folder", name),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::model_type::ModelType;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_ready_descriptor_and_worker_sentinel() {
        let job = std::env::temp_dir().join(format!("parallel_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&job).unwrap();

        let mut model = Model::new("hw", ModelType::HurryWave);
        model.ensemble = true;
        let spec = JobSpec {
            model: model.id.clone(),
            model_type: model.model_type,
            job_path: job.clone(),
            run_script: "run.sh".to_string(),
            ensemble: true,
            parameters: BTreeMap::new(),
        };

        let backend = ParallelBackend::new();
        let handle = backend.submit(&model, &spec).await.unwrap();

        let descriptor: ReadyDescriptorDto = serde_json::from_str(&fs::read_to_string(job.join(READY_FILE)).unwrap()).unwrap();
        assert_eq!(descriptor.model, "hw");
        assert_eq!(descriptor.model_type, "hurrywave");
        assert!(descriptor.ensemble);

        assert_eq!(backend.poll(&handle).await.unwrap(), JobPoll::Running);

        fs::write(job.join("finished.txt"), "finished\nworker-3\n").unwrap();
        assert_eq!(backend.poll(&handle).await.unwrap(), JobPoll::Done { worker: Some("worker-3".to_string()) });

        fs::remove_dir_all(job).unwrap();
    }
}
