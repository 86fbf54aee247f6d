use std::cmp::Ordering;

use crate::domain::cluster::boundary_value::BoundaryValueProvider;
use crate::domain::cluster::cluster::{Cluster, RunCondition};
use crate::domain::model::model::{BoundaryKind, ModelStatus, PeakBoundary};
use crate::domain::model::model_store::{ModelKey, ModelStore};
use crate::domain::utils::statistics::ANALYTICS_TARGET;
use crate::error::Error;

/// State of the parents of a cluster member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upstream {
    Pending,
    Finished,
    /// A parent failed or left the active set; the member will fail by cascade.
    Failed,
}

/// Decides which members of a cluster are worth simulating.
///
/// `check_ready` never removes models itself. It returns the members to drop and the
/// caller removes them from the active set after the pass over all clusters.
#[derive(Debug)]
pub struct ClusterAdmissionController<'a> {
    provider: &'a dyn BoundaryValueProvider,
}

impl<'a> ClusterAdmissionController<'a> {
    pub fn new(provider: &'a dyn BoundaryValueProvider) -> Self {
        ClusterAdmissionController { provider }
    }

    /// Evaluates the cluster if its members' parents allow it.
    ///
    /// # Returns
    /// The members staged for removal.
    pub fn check_ready(&self, cluster: &mut Cluster, store: &mut ModelStore) -> Vec<ModelKey> {
        if cluster.ready {
            return Vec::new();
        }

        match cluster.run_condition {
            RunCondition::TopN => self.check_topn(cluster, store),
            RunCondition::Threshold | RunCondition::EnsembleThreshold => self.check_threshold(cluster, store),
        }
    }

    fn check_topn(&self, cluster: &mut Cluster, store: &mut ModelStore) -> Vec<ModelKey> {
        let members: Vec<ModelKey> = cluster.members.iter().copied().filter(|key| store.contains(*key)).collect();

        let mut upstream = Vec::with_capacity(members.len());
        for key in &members {
            match upstream_of(store, *key) {
                Upstream::Pending => return Vec::new(),
                state => upstream.push((*key, state)),
            }
        }

        // Phase 1: rank the members that can actually run.
        let mut ranked: Vec<(ModelKey, f64)> = upstream
            .iter()
            .filter(|(_, state)| *state == Upstream::Finished)
            .map(|(key, _)| (*key, self.adjusted_peak(cluster, store, *key)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        // Phase 2: keep the best N. Members that already started (e.g. after a resume) stay.
        let (started, waiting): (Vec<_>, Vec<_>) = ranked.into_iter().partition(|(key, _)| !is_waiting(store, *key));
        let mut removals = Vec::new();
        let mut kept = started.len();
        for (key, adjusted) in waiting {
            let admissible = !cluster.use_threshold || adjusted > 0.0;
            if admissible && kept < cluster.topn {
                kept += 1;
                self.log_decision(cluster, store, key, adjusted, true);
            } else {
                self.log_decision(cluster, store, key, adjusted, false);
                removals.push(key);
            }
        }

        cluster.evaluated.extend(members);
        cluster.ready = true;
        log::info!("Cluster {} is ready: {} member(s) will run, {} removed.", cluster.id, kept, removals.len());
        removals
    }

    fn check_threshold(&self, cluster: &mut Cluster, store: &mut ModelStore) -> Vec<ModelKey> {
        let members: Vec<ModelKey> = cluster.members.iter().copied().filter(|key| store.contains(*key)).collect();
        let mut removals = Vec::new();

        for key in &members {
            if cluster.evaluated.contains(key) {
                continue;
            }

            match upstream_of(store, *key) {
                Upstream::Pending => continue,
                Upstream::Failed => {
                    cluster.evaluated.insert(*key);
                    continue;
                }
                Upstream::Finished => {}
            }

            if !is_waiting(store, *key) {
                cluster.evaluated.insert(*key);
                continue;
            }

            let deterministic = store.get(*key).map(|model| !model.ensemble).unwrap_or(false);
            if cluster.run_condition == RunCondition::EnsembleThreshold && deterministic {
                cluster.evaluated.insert(*key);
                continue;
            }

            let adjusted = self.adjusted_peak(cluster, store, *key);
            let keep = adjusted > 0.0;
            self.log_decision(cluster, store, *key, adjusted, keep);
            if !keep {
                removals.push(*key);
            }
            cluster.evaluated.insert(*key);
        }

        if members.iter().all(|key| cluster.evaluated.contains(key)) {
            cluster.ready = true;
            log::info!("Cluster {} is ready.", cluster.id);
        }

        removals
    }

    /// Peak boundary value minus the member's threshold and the cluster margin.
    /// The peak is computed once and stored on the model.
    fn adjusted_peak(&self, cluster: &Cluster, store: &mut ModelStore, key: ModelKey) -> f64 {
        let Some(model) = store.get(key) else {
            return PeakBoundary::MISSING;
        };

        let stored = model.peak_boundary;
        let peak = match stored {
            Some(peak) => peak,
            None => {
                let parent = boundary_parent(store, key);
                let computed = match parent.and_then(|parent| store.get(parent)) {
                    Some(parent) => self.provider.peak_boundary(model, parent, cluster.hm0_fraction),
                    None => Err(Error::BoundaryValueError {
                        model: model.id.to_string(),
                        reason: "model is not nested in any other model".to_string(),
                    }),
                };

                let peak = computed.unwrap_or_else(|e| {
                    log::warn!("{}", e);
                    PeakBoundary::missing()
                });
                if let Some(model) = store.get_mut(key) {
                    model.peak_boundary = Some(peak);
                }
                peak
            }
        };

        let threshold = store.get(key).map(|model| model.boundary_twl_threshold).unwrap_or(0.0);
        peak.value - threshold - cluster.boundary_twl_margin
    }

    fn log_decision(&self, cluster: &Cluster, store: &ModelStore, key: ModelKey, adjusted: f64, keep: bool) {
        let name = store.get(key).map(|model| model.id.to_string()).unwrap_or_default();

        if keep {
            log::info!("Cluster {}: model {} will run (adjusted peak {:.2} m).", cluster.id, name, adjusted);
        } else {
            log::info!("Cluster {}: model {} is removed (adjusted peak {:.2} m).", cluster.id, name, adjusted);
        }

        tracing::info!(
            target: ANALYTICS_TARGET,
            LogDescription = "Cluster admission",
            Cluster = %cluster.id,
            RunCondition = %cluster.run_condition,
            ModelName = %name,
            AdjustedPeak = adjusted,
            Admitted = keep,
        );
    }
}

fn upstream_of(store: &ModelStore, key: ModelKey) -> Upstream {
    let Some(model) = store.get(key) else {
        return Upstream::Failed;
    };

    let mut state = Upstream::Finished;
    for parent in model.parent_keys() {
        match store.get(parent).map(|p| p.status) {
            None | Some(ModelStatus::Failed) => state = Upstream::Failed,
            Some(ModelStatus::Finished) => {}
            Some(_) => return Upstream::Pending,
        }
    }
    state
}

fn is_waiting(store: &ModelStore, key: ModelKey) -> bool {
    store.get(key).map(|model| model.status == ModelStatus::Waiting).unwrap_or(false)
}

/// The parent that delivers the water level: flow first, then bw, then wave.
fn boundary_parent(store: &ModelStore, key: ModelKey) -> Option<ModelKey> {
    let model = store.get(key)?;
    [BoundaryKind::Flow, BoundaryKind::Bw, BoundaryKind::Wave].into_iter().find_map(|kind| *model.parents.get(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cluster::boundary_value_mock::StaticBoundaryProvider;
    use crate::domain::model::model::Model;
    use crate::domain::model::model_type::ModelType;
    use crate::domain::scenario::nesting;
    use crate::domain::utils::id::ModelId;

    fn setup(members: &[&str]) -> (ModelStore, ModelKey, Vec<ModelKey>) {
        let mut store = ModelStore::new();
        let parent = store.add(Model::new("coarse", ModelType::Delft3dFm)).unwrap();
        let keys = members
            .iter()
            .map(|name| {
                let mut model = Model::new(*name, ModelType::Sfincs);
                model.nested_in.flow = Some(ModelId::new("coarse"));
                model.boundary_twl_threshold = 0.0;
                store.add(model).unwrap()
            })
            .collect();
        nesting::link(&mut store).unwrap();
        (store, parent, keys)
    }

    #[test]
    fn test_topn_waits_for_parents() {
        let (mut store, _, keys) = setup(&["a", "b"]);
        let provider = StaticBoundaryProvider::new().with_peak("a", 1.0).with_peak("b", 2.0);
        let mut cluster = Cluster::new("c", RunCondition::TopN, keys);

        let removals = ClusterAdmissionController::new(&provider).check_ready(&mut cluster, &mut store);
        assert!(removals.is_empty());
        assert!(!cluster.ready);
        assert_eq!(provider.request_count(), 0);
    }

    #[test]
    fn test_topn_without_threshold_keeps_best_n() {
        let (mut store, parent, keys) = setup(&["a", "b", "c"]);
        store.get_mut(parent).unwrap().status = ModelStatus::Finished;

        let provider = StaticBoundaryProvider::new().with_peak("a", -1.0).with_peak("b", -3.0).with_peak("c", -2.0);
        let mut cluster = Cluster::new("c", RunCondition::TopN, keys.clone());
        cluster.topn = 2;
        cluster.use_threshold = false;

        let removals = ClusterAdmissionController::new(&provider).check_ready(&mut cluster, &mut store);
        assert_eq!(removals, vec![keys[1]]);
        assert!(cluster.ready);

        // Inert once ready.
        let again = ClusterAdmissionController::new(&provider).check_ready(&mut cluster, &mut store);
        assert!(again.is_empty());
        assert_eq!(provider.request_count(), 3);
    }

    #[test]
    fn test_failed_peak_computation_falls_back_to_missing_value() {
        let (mut store, parent, keys) = setup(&["a"]);
        store.get_mut(parent).unwrap().status = ModelStatus::Finished;

        let provider = StaticBoundaryProvider::new();
        let mut cluster = Cluster::new("c", RunCondition::TopN, keys.clone());

        let removals = ClusterAdmissionController::new(&provider).check_ready(&mut cluster, &mut store);
        assert_eq!(removals, keys);
        assert_eq!(store.get(keys[0]).unwrap().peak_boundary.unwrap().value, -999.0);
    }

    #[test]
    fn test_threshold_keeps_members_above_threshold() {
        let (mut store, parent, keys) = setup(&["low", "high"]);
        store.get_mut(parent).unwrap().status = ModelStatus::Finished;

        let provider = StaticBoundaryProvider::new().with_peak("low", 0.5).with_peak("high", 2.5);
        let mut cluster = Cluster::new("c", RunCondition::Threshold, keys.clone());
        for key in &keys {
            store.get_mut(*key).unwrap().boundary_twl_threshold = 1.0;
        }

        let removals = ClusterAdmissionController::new(&provider).check_ready(&mut cluster, &mut store);
        assert_eq!(removals, vec![keys[0]]);
        assert!(cluster.ready);
        assert!(cluster.admits(keys[1]));
    }

    #[test]
    fn test_ensemble_threshold_always_keeps_deterministic_member() {
        let (mut store, parent, keys) = setup(&["best_track", "member_01"]);
        store.get_mut(parent).unwrap().status = ModelStatus::Finished;
        store.get_mut(keys[1]).unwrap().ensemble = true;

        let provider = StaticBoundaryProvider::new().with_peak("best_track", -5.0).with_peak("member_01", -5.0);
        let mut cluster = Cluster::new("c", RunCondition::EnsembleThreshold, keys.clone());

        let removals = ClusterAdmissionController::new(&provider).check_ready(&mut cluster, &mut store);
        assert_eq!(removals, vec![keys[1]]);
        assert_eq!(provider.request_count(), 1);
    }

    #[test]
    fn test_member_with_failed_parent_is_not_ranked() {
        let (mut store, parent, keys) = setup(&["a"]);
        store.get_mut(parent).unwrap().status = ModelStatus::Failed;

        let provider = StaticBoundaryProvider::new();
        let mut cluster = Cluster::new("c", RunCondition::TopN, keys);

        let removals = ClusterAdmissionController::new(&provider).check_ready(&mut cluster, &mut store);
        assert!(removals.is_empty());
        assert!(cluster.ready);
        assert_eq!(provider.request_count(), 0);
    }
}
