use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::{Child, Command};

use crate::domain::backend::execution_backend_trait::{ExecutionBackend, JobHandle, JobLocator, JobPoll, JobSpec};
use crate::domain::backend::run_mode::RunMode;
use crate::domain::backend::sentinel::{FINISHED_FILE, read_finished, write_finished};
use crate::domain::model::model::Model;
use crate::domain::utils::id::ModelId;
use crate::error::{Error, Result};

pub const RUN_LOG_FILE: &str = "run.log";

/// Runs one job at a time as a child process on the orchestrating host.
#[derive(Debug)]
pub struct SerialBackend {
    worker_name: String,
    processes: Mutex<HashMap<ModelId, Child>>,
}

impl SerialBackend {
    pub fn new(worker_name: impl Into<String>) -> Self {
        SerialBackend { worker_name: worker_name.into(), processes: Mutex::new(HashMap::new()) }
    }

    fn backend_error(model: &ModelId, reason: impl Into<String>) -> Error {
        Error::ExecutionBackendError { model: model.to_string(), reason: reason.into() }
    }

    /// Checks the child process of a job without blocking.
    ///
    /// # Returns
    /// `true` once the process has exited. The entry is removed in that case.
    fn process_exited(&self, model: &ModelId) -> Result<bool> {
        let mut processes = self.processes.lock().map_err(|_| Self::backend_error(model, "process table poisoned"))?;

        let child = match processes.get_mut(model) {
            Some(child) => child,
            None => return Err(Self::backend_error(model, "no running process is known for this job")),
        };

        match child.try_wait()? {
            Some(status) => {
                if !status.success() {
                    log::warn!("Run script of model {} exited with {}.", model, status);
                }
                processes.remove(model);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ExecutionBackend for SerialBackend {
    fn run_mode(&self) -> RunMode {
        RunMode::Serial
    }

    async fn submit(&self, model: &Model, spec: &JobSpec) -> Result<JobHandle> {
        let script = spec.job_path.join(&spec.run_script);
        if !script.is_file() {
            return Err(Self::backend_error(&model.id, format!("run script {} not found", script.display())));
        }

        let log_file = File::create(spec.job_path.join(RUN_LOG_FILE))?;
        let err_file = log_file.try_clone()?;

        let child = Command::new("sh")
            .arg(&spec.run_script)
            .current_dir(&spec.job_path)
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(err_file))
            .spawn()
            .map_err(|e| Self::backend_error(&model.id, format!("could not start {}: {}", script.display(), e)))?;

        log::info!("Started model {} locally (pid {:?}).", model.id, child.id());

        self.processes
            .lock()
            .map_err(|_| Self::backend_error(&model.id, "process table poisoned"))?
            .insert(model.id.clone(), child);

        Ok(JobHandle { model: model.id.clone(), run_mode: RunMode::Serial, locator: JobLocator::Workspace(spec.job_path.clone()) })
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobPoll> {
        let job_path: &Path = match &handle.locator {
            JobLocator::Workspace(path) => path,
            JobLocator::Workflow { name } => {
                return Err(Self::backend_error(&handle.model, format!("workflow {} cannot be polled locally", name)));
            }
        };

        if let Some(worker) = read_finished(job_path)? {
            self.processes.lock().map_err(|_| Self::backend_error(&handle.model, "process table poisoned"))?.remove(&handle.model);
            return Ok(JobPoll::Done { worker: Some(worker.unwrap_or_else(|| self.worker_name.clone())) });
        }

        // The process entry is gone once it exited, so the job is done even without a sentinel.
        if self.process_exited(&handle.model)? {
            if let Err(e) = write_finished(job_path, &self.worker_name) {
                log::error!("Could not write {} for model {}: {}", FINISHED_FILE, handle.model, e);
            }
            return Ok(JobPoll::Done { worker: Some(self.worker_name.clone()) });
        }

        Ok(JobPoll::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::model_type::ModelType;
    use std::collections::BTreeMap;
    use std::fs;
    use std::time::Duration;

    fn spec_for(model: &Model, job_path: &Path) -> JobSpec {
        JobSpec {
            model: model.id.clone(),
            model_type: model.model_type,
            job_path: job_path.to_path_buf(),
            run_script: "run.sh".to_string(),
            ensemble: false,
            parameters: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_run_script_is_rejected() {
        let job = std::env::temp_dir().join(format!("serial_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&job).unwrap();

        let model = Model::new("sf", ModelType::Sfincs);
        let backend = SerialBackend::new("host");
        let result = backend.submit(&model, &spec_for(&model, &job)).await;
        assert!(matches!(result, Err(Error::ExecutionBackendError { .. })));

        fs::remove_dir_all(job).unwrap();
    }

    #[tokio::test]
    async fn test_exited_process_writes_sentinel() {
        let job = std::env::temp_dir().join(format!("serial_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&job).unwrap();
        fs::write(job.join("run.sh"), "echo simulated > result.txt\n").unwrap();

        let model = Model::new("sf", ModelType::Sfincs);
        let backend = SerialBackend::new("host-a");
        let handle = backend.submit(&model, &spec_for(&model, &job)).await.unwrap();

        let mut poll = JobPoll::Running;
        for _ in 0..100 {
            poll = backend.poll(&handle).await.unwrap();
            if poll.is_done() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert_eq!(poll, JobPoll::Done { worker: Some("host-a".to_string()) });
        assert!(job.join("result.txt").is_file());
        assert_eq!(read_finished(&job).unwrap(), Some(Some("host-a".to_string())));

        fs::remove_dir_all(job).unwrap();
    }

    #[tokio::test]
    async fn test_exited_process_is_done_when_sentinel_cannot_be_written() {
        let job = std::env::temp_dir().join(format!("serial_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&job).unwrap();
        fs::write(job.join("run.sh"), format!("rm -rf '{}'\n", job.display())).unwrap();

        let model = Model::new("sf", ModelType::Sfincs);
        let backend = SerialBackend::new("host-b");
        let handle = backend.submit(&model, &spec_for(&model, &job)).await.unwrap();

        let mut poll = JobPoll::Running;
        for _ in 0..100 {
            poll = backend.poll(&handle).await.unwrap();
            if poll.is_done() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert_eq!(poll, JobPoll::Done { worker: Some("host-b".to_string()) });
        assert!(!job.exists());
    }
}
