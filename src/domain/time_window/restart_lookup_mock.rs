use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::domain::model::model::{BoundaryKind, Model, RestartFile};
use crate::domain::time_window::restart_lookup::{RestartLookup, format_restart_time, latest_in_window};
use crate::domain::utils::id::ModelId;

/// Restart archive kept in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRestartLookup {
    files: HashMap<(ModelId, BoundaryKind), Vec<RestartFile>>,
}

impl InMemoryRestartLookup {
    pub fn new() -> Self {
        InMemoryRestartLookup::default()
    }

    pub fn add(&mut self, model: &str, kind: BoundaryKind, time: DateTime<Utc>) -> &mut Self {
        let path = PathBuf::from(format!("{}.{}.rst", model, format_restart_time(time)));
        self.files.entry((ModelId::new(model), kind)).or_default().push(RestartFile { time, path });
        self
    }
}

impl RestartLookup for InMemoryRestartLookup {
    fn find(&self, model: &Model, kind: BoundaryKind, required_start: DateTime<Utc>) -> Option<RestartFile> {
        let files = self.files.get(&(model.id.clone(), kind))?;
        latest_in_window(files.iter().cloned(), required_start, *model.spinup.get(kind))
    }
}
