use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::domain::model::model::Model;
use crate::domain::model::model_kind_base::ModelKindBase;
use crate::domain::model::model_kind_trait::{ModelKind, NestingSource};
use crate::domain::model::model_type::ModelType;
use crate::error::{Error, Result};

/// Model kind that only records its lifecycle calls and never touches the file system.
#[derive(Debug, Clone)]
pub struct MockModelKind {
    base: ModelKindBase,
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
    failing_pre_process: Arc<Mutex<HashSet<String>>>,
    failing_post_process: Arc<Mutex<HashSet<String>>>,
}

impl MockModelKind {
    pub fn new(model_type: ModelType) -> Self {
        MockModelKind {
            base: ModelKindBase::new(model_type),
            calls: Arc::new(Mutex::new(Vec::new())),
            failing_pre_process: Arc::new(Mutex::new(HashSet::new())),
            failing_post_process: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn fail_pre_process(&self, model: &str) {
        self.failing_pre_process.lock().unwrap().insert(model.to_string());
    }

    pub fn fail_post_process(&self, model: &str) {
        self.failing_post_process.lock().unwrap().insert(model.to_string());
    }

    /// Recorded `(hook, model)` pairs in call order.
    pub fn recorded_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, hook: &str) -> Vec<String> {
        self.recorded_calls().into_iter().filter(|(h, _)| h == hook).map(|(_, model)| model).collect()
    }

    fn record(&self, hook: &str, model: &Model) {
        self.calls.lock().unwrap().push((hook.to_string(), model.id.to_string()));
    }
}

impl ModelKind for MockModelKind {
    fn get_base(&self) -> &ModelKindBase {
        &self.base
    }

    fn pre_process(&self, model: &Model, _nesting: &[NestingSource<'_>], _cycle: &str) -> Result<()> {
        self.record("pre_process", model);
        if self.failing_pre_process.lock().unwrap().contains(model.id.as_str()) {
            return Err(Error::PreProcessError { model: model.id.to_string(), reason: "mock failure".to_string() });
        }
        Ok(())
    }

    fn move_output(&self, model: &Model) -> Result<()> {
        self.record("move_output", model);
        Ok(())
    }

    fn post_process(&self, model: &Model) -> Result<()> {
        self.record("post_process", model);
        if self.failing_post_process.lock().unwrap().contains(model.id.as_str()) {
            return Err(Error::PostProcessError { model: model.id.to_string(), reason: "mock failure".to_string() });
        }
        Ok(())
    }
}
