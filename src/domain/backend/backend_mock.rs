use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::domain::backend::execution_backend_trait::{ExecutionBackend, JobHandle, JobLocator, JobPoll, JobSpec};
use crate::domain::backend::run_mode::RunMode;
use crate::domain::model::model::Model;
use crate::error::{Error, Result};

pub const MOCK_WORKER: &str = "mock-worker";

#[derive(Debug, Default)]
pub struct MockBackendState {
    pub submissions: Vec<String>,
    pub polls: HashMap<String, usize>,
    pub running: HashSet<String>,
    pub max_running: usize,
    pub held: HashSet<String>,
    pub failing_submits: HashSet<String>,
    pub failing_polls: HashSet<String>,
}

/// Backend without side effects. A job is done after a fixed number of polls unless it is held.
/// Clones share their state, so tests keep one clone to inspect what the scheduler did.
#[derive(Debug, Clone)]
pub struct MockBackend {
    run_mode: RunMode,
    polls_to_finish: usize,
    pub state: Arc<Mutex<MockBackendState>>,
}

impl MockBackend {
    pub fn new(run_mode: RunMode) -> Self {
        MockBackend { run_mode, polls_to_finish: 1, state: Arc::new(Mutex::new(MockBackendState::default())) }
    }

    pub fn finish_after(mut self, polls: usize) -> Self {
        self.polls_to_finish = polls.max(1);
        self
    }

    pub fn hold(&self, model: &str) {
        self.state.lock().unwrap().held.insert(model.to_string());
    }

    pub fn release(&self, model: &str) {
        self.state.lock().unwrap().held.remove(model);
    }

    pub fn fail_submit(&self, model: &str) {
        self.state.lock().unwrap().failing_submits.insert(model.to_string());
    }

    pub fn heal_submit(&self, model: &str) {
        self.state.lock().unwrap().failing_submits.remove(model);
    }

    pub fn fail_poll(&self, model: &str) {
        self.state.lock().unwrap().failing_polls.insert(model.to_string());
    }

    pub fn heal_poll(&self, model: &str) {
        self.state.lock().unwrap().failing_polls.remove(model);
    }

    pub fn submissions(&self) -> Vec<String> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn submission_count(&self, model: &str) -> usize {
        self.state.lock().unwrap().submissions.iter().filter(|name| name.as_str() == model).count()
    }

    pub fn running(&self) -> HashSet<String> {
        self.state.lock().unwrap().running.clone()
    }

    pub fn max_running(&self) -> usize {
        self.state.lock().unwrap().max_running
    }
}

#[async_trait]
impl ExecutionBackend for MockBackend {
    fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    async fn submit(&self, model: &Model, spec: &JobSpec) -> Result<JobHandle> {
        let mut state = self.state.lock().unwrap();
        let name = model.id.to_string();

        if state.failing_submits.contains(&name) {
            return Err(Error::ExecutionBackendError { model: name, reason: "submission rejected".to_string() });
        }

        state.submissions.push(name.clone());
        state.running.insert(name);
        state.max_running = state.max_running.max(state.running.len());

        Ok(JobHandle { model: model.id.clone(), run_mode: self.run_mode, locator: JobLocator::Workspace(spec.job_path.clone()) })
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobPoll> {
        let mut state = self.state.lock().unwrap();
        let name = handle.model.to_string();

        if state.failing_polls.contains(&name) {
            return Err(Error::ExecutionBackendError { model: name, reason: "status unavailable".to_string() });
        }

        let count = state.polls.entry(name.clone()).or_insert(0);
        *count += 1;

        if *count >= self.polls_to_finish && !state.held.contains(&name) {
            state.running.remove(&name);
            return Ok(JobPoll::Done { worker: Some(MOCK_WORKER.to_string()) });
        }

        Ok(JobPoll::Running)
    }
}
