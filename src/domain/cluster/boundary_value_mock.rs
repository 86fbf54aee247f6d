use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::cluster::boundary_value::BoundaryValueProvider;
use crate::domain::model::model::{Model, PeakBoundary};
use crate::error::{Error, Result};

/// Returns configured peak values per model name; unknown models fail.
#[derive(Debug, Default, Clone)]
pub struct StaticBoundaryProvider {
    peaks: HashMap<String, f64>,
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl StaticBoundaryProvider {
    pub fn new() -> Self {
        StaticBoundaryProvider::default()
    }

    pub fn with_peak(mut self, model: &str, value: f64) -> Self {
        self.peaks.insert(model.to_string(), value);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl BoundaryValueProvider for StaticBoundaryProvider {
    fn peak_boundary(&self, model: &Model, _parent: &Model, _hm0_fraction: f64) -> Result<PeakBoundary> {
        self.requests.lock().unwrap().push(model.id.to_string());

        match self.peaks.get(model.id.as_str()) {
            Some(value) => Ok(PeakBoundary { value: *value, time: None }),
            None => Err(Error::BoundaryValueError { model: model.id.to_string(), reason: "no peak configured".to_string() }),
        }
    }
}
