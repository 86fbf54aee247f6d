use chrono::{DateTime, Utc};

use crate::domain::model::model::{BoundaryKind, TimeWindow};
use crate::domain::model::model_store::{ModelKey, ModelStore};
use crate::domain::time_window::restart_lookup::RestartLookup;
use crate::domain::utils::time::floor_to_day;

/// Computes the simulation window of every model of a cycle.
///
/// Per boundary kind, every model starts with the nominal `[cycle_start, cycle_stop)`
/// window. From each leaf of the nesting forest the resolver walks up to the root:
/// a model either pins its start to a restart file in `(required - spinup, required]`
/// or moves its start back by its spin-up, and the parent then has to cover at least
/// that start. Starts only ever move backwards, so the order of the leaves is irrelevant.
#[derive(Debug)]
pub struct TimeWindowResolver<'a> {
    lookup: &'a dyn RestartLookup,
}

impl<'a> TimeWindowResolver<'a> {
    pub fn new(lookup: &'a dyn RestartLookup) -> Self {
        TimeWindowResolver { lookup }
    }

    /// Annotates all models with their windows.
    ///
    /// # Returns
    /// The reference date of the cycle: the earliest resolved start floored to midnight,
    /// or `None` for an empty model set.
    pub fn resolve(&self, store: &mut ModelStore, cycle_start: DateTime<Utc>, cycle_stop: DateTime<Utc>) -> Option<DateTime<Utc>> {
        for kind in BoundaryKind::TIMED {
            self.resolve_kind(store, kind, cycle_start, cycle_stop);
        }

        // Forcing collaborators need both windows, also for single capability models.
        for key in store.keys() {
            if let Some(model) = store.get_mut(key) {
                if model.windows.flow.is_none() {
                    model.windows.flow = model.windows.wave.as_ref().map(|wave| TimeWindow::new(wave.start, wave.stop));
                } else if model.windows.wave.is_none() {
                    model.windows.wave = model.windows.flow.as_ref().map(|flow| TimeWindow::new(flow.start, flow.stop));
                }
            }
        }

        store.iter().filter_map(|(_, model)| model.earliest_start()).min().map(floor_to_day)
    }

    fn resolve_kind(&self, store: &mut ModelStore, kind: BoundaryKind, cycle_start: DateTime<Utc>, cycle_stop: DateTime<Utc>) {
        let participants: Vec<ModelKey> = store
            .iter()
            .filter(|(_, model)| {
                model.has_kind(kind) || model.parents.get(kind).is_some() || !model.children.get(kind).is_empty()
            })
            .map(|(key, _)| key)
            .collect();

        for key in &participants {
            if let Some(model) = store.get_mut(*key) {
                *model.windows.get_mut(kind) = Some(TimeWindow::new(cycle_start, cycle_stop));
            }
        }

        let leaves: Vec<ModelKey> = participants
            .iter()
            .copied()
            .filter(|key| store.get(*key).map(|model| model.children.get(kind).is_empty()).unwrap_or(false))
            .collect();

        for leaf in leaves {
            self.walk_up(store, kind, leaf, cycle_start);
        }
    }

    fn walk_up(&self, store: &mut ModelStore, kind: BoundaryKind, leaf: ModelKey, cycle_start: DateTime<Utc>) {
        let mut required_start = cycle_start;
        let mut current = Some(leaf);
        let mut steps = 0;

        while let Some(key) = current {
            steps += 1;
            if steps > store.len() {
                log::error!("Aborting {} time window walk from a leaf, the nesting is not a tree.", kind);
                return;
            }

            let Some(model) = store.get(key) else {
                return;
            };

            let (candidate_start, restart) = match self.lookup.find(model, kind, required_start) {
                Some(restart) => (restart.time, Some(restart)),
                None => (required_start - *model.spinup.get(kind), None),
            };
            let parent = *model.parents.get(kind);

            let Some(model) = store.get_mut(key) else {
                return;
            };
            let window = model.windows.get_mut(kind).get_or_insert_with(|| TimeWindow::new(required_start, required_start));

            if candidate_start < window.start || (candidate_start == window.start && window.restart.is_none()) {
                window.start = candidate_start;
                window.restart = restart;
            }

            required_start = window.start;
            current = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::model::Model;
    use crate::domain::model::model_type::ModelType;
    use crate::domain::scenario::nesting;
    use crate::domain::time_window::restart_lookup_mock::InMemoryRestartLookup;
    use crate::domain::utils::id::ModelId;
    use chrono::{TimeDelta, TimeZone};

    fn t(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn flow_model(name: &str, parent: Option<&str>, spinup_hours: i64) -> Model {
        let mut model = Model::new(name, ModelType::Sfincs);
        model.nested_in.flow = parent.map(ModelId::new);
        model.spinup.flow = TimeDelta::hours(spinup_hours);
        model
    }

    #[test]
    fn test_isolated_model_without_spinup_keeps_nominal_window() {
        let mut store = ModelStore::new();
        let key = store.add(flow_model("solo", None, 0)).unwrap();
        nesting::link(&mut store).unwrap();

        let lookup = InMemoryRestartLookup::new();
        let reference = TimeWindowResolver::new(&lookup).resolve(&mut store, t(2024, 1, 1, 6), t(2024, 1, 2, 6));

        let window = store.get(key).unwrap().windows.flow.clone().unwrap();
        assert_eq!(window.start, t(2024, 1, 1, 6));
        assert_eq!(window.stop, t(2024, 1, 2, 6));
        assert!(window.restart.is_none());
        assert_eq!(reference, Some(t(2024, 1, 1, 0)));
    }

    #[test]
    fn test_branches_take_the_earliest_start() {
        let mut store = ModelStore::new();
        let root = store.add(flow_model("root", None, 0)).unwrap();
        store.add(flow_model("short", Some("root"), 2)).unwrap();
        store.add(flow_model("long", Some("root"), 10)).unwrap();
        store.add(flow_model("medium", Some("root"), 5)).unwrap();
        nesting::link(&mut store).unwrap();

        let lookup = InMemoryRestartLookup::new();
        TimeWindowResolver::new(&lookup).resolve(&mut store, t(2024, 1, 1, 0), t(2024, 1, 2, 0));

        assert_eq!(store.get(root).unwrap().windows.flow.as_ref().unwrap().start, t(2023, 12, 31, 14));
    }

    #[test]
    fn test_wave_only_model_gets_flow_window() {
        let mut store = ModelStore::new();
        let mut wave = Model::new("hw", ModelType::HurryWave);
        wave.spinup.wave = TimeDelta::hours(24);
        let key = store.add(wave).unwrap();
        nesting::link(&mut store).unwrap();

        let lookup = InMemoryRestartLookup::new();
        TimeWindowResolver::new(&lookup).resolve(&mut store, t(2024, 1, 1, 0), t(2024, 1, 2, 0));

        let model = store.get(key).unwrap();
        assert_eq!(model.windows.wave.as_ref().unwrap().start, t(2023, 12, 31, 0));
        assert_eq!(model.windows.flow.as_ref().unwrap().start, t(2023, 12, 31, 0));
        assert_eq!(model.windows.flow.as_ref().unwrap().stop, t(2024, 1, 2, 0));
    }
}
