use serde_json::json;
use std::collections::HashSet;

use cycle_orchestrator::api::scenario_dto::ScenarioDto;
use cycle_orchestrator::domain::cluster::boundary_value_mock::StaticBoundaryProvider;
use cycle_orchestrator::domain::cluster::cluster_admission::ClusterAdmissionController;
use cycle_orchestrator::domain::model::model::ModelStatus;
use cycle_orchestrator::domain::scenario::scenario::Scenario;
use cycle_orchestrator::domain::utils::id::ModelId;

const MEMBERS: [&str; 5] = ["m5", "m3", "m8", "m1", "m6"];

/// Five members nested in `coarse`, all with a threshold of 0 m.
fn cluster_scenario(run_condition: &str, topn: usize, use_threshold: bool) -> Scenario {
    let mut models = vec![json!({ "name": "coarse", "type": "delft3dfm" })];
    for name in MEMBERS {
        models.push(json!({
            "name": name,
            "type": "sfincs",
            "flow_nested": "coarse",
            "boundary_twl_threshold": 0.0,
            "ensemble": name != "m5"
        }));
    }

    let dto: ScenarioDto = serde_json::from_value(json!({
        "name": "clustered",
        "runtime_hours": 24.0,
        "models": models,
        "clusters": [{
            "name": "coast",
            "run_condition": run_condition,
            "topn": topn,
            "use_threshold": use_threshold,
            "models": MEMBERS
        }]
    }))
    .unwrap();

    Scenario::try_from(dto).unwrap()
}

fn finish(scenario: &mut Scenario, name: &str) {
    let key = scenario.models.key_of(&ModelId::new(name)).unwrap();
    scenario.models.get_mut(key).unwrap().status = ModelStatus::Finished;
}

fn names(scenario: &Scenario, keys: &[cycle_orchestrator::domain::model::model_store::ModelKey]) -> HashSet<String> {
    keys.iter().map(|key| scenario.models.get(*key).unwrap().id.to_string()).collect()
}

fn provider(peaks: [f64; 5]) -> StaticBoundaryProvider {
    MEMBERS.iter().zip(peaks).fold(StaticBoundaryProvider::new(), |provider, (name, peak)| provider.with_peak(name, peak))
}

#[test]
fn test_topn_keeps_the_three_highest_positive_values() {
    let mut scenario = cluster_scenario("topn", 3, true);
    finish(&mut scenario, "coarse");
    let provider = provider([5.0, 3.0, 8.0, 1.0, 6.0]);
    let controller = ClusterAdmissionController::new(&provider);

    let removals = controller.check_ready(&mut scenario.clusters[0], &mut scenario.models);

    assert_eq!(names(&scenario, &removals), HashSet::from(["m3".to_string(), "m1".to_string()]));
    assert!(scenario.clusters[0].ready);

    for key in removals {
        scenario.models.remove(key);
    }
    let kept: HashSet<String> = MEMBERS.iter().filter(|name| scenario.models.get_by_name(&ModelId::new(**name)).is_some()).map(|name| name.to_string()).collect();
    assert_eq!(kept, HashSet::from(["m8".to_string(), "m6".to_string(), "m5".to_string()]));
}

#[test]
fn test_topn_with_threshold_drops_non_positive_members() {
    let mut scenario = cluster_scenario("topn", 3, true);
    finish(&mut scenario, "coarse");
    let provider = provider([5.0, -3.0, 0.0, -1.0, 6.0]);
    let controller = ClusterAdmissionController::new(&provider);

    let removals = controller.check_ready(&mut scenario.clusters[0], &mut scenario.models);

    assert_eq!(names(&scenario, &removals), HashSet::from(["m3".to_string(), "m8".to_string(), "m1".to_string()]));
}

#[test]
fn test_nothing_happens_before_the_parent_finished() {
    let mut scenario = cluster_scenario("topn", 3, true);
    let provider = provider([5.0, 3.0, 8.0, 1.0, 6.0]);
    let controller = ClusterAdmissionController::new(&provider);

    let removals = controller.check_ready(&mut scenario.clusters[0], &mut scenario.models);

    assert!(removals.is_empty());
    assert!(!scenario.clusters[0].ready);
    assert_eq!(provider.request_count(), 0);

    finish(&mut scenario, "coarse");
    let removals = controller.check_ready(&mut scenario.clusters[0], &mut scenario.models);
    assert_eq!(removals.len(), 2);

    // A ready cluster is never evaluated again.
    assert!(controller.check_ready(&mut scenario.clusters[0], &mut scenario.models).is_empty());
    assert_eq!(provider.request_count(), 5);
}

#[test]
fn test_ensemble_threshold_keeps_the_deterministic_member() {
    let mut scenario = cluster_scenario("ensemble_threshold", 10, true);
    finish(&mut scenario, "coarse");
    // m5 is the deterministic member and would be dropped on its peak.
    let provider = provider([-5.0, 3.0, -8.0, 1.0, -6.0]);
    let controller = ClusterAdmissionController::new(&provider);

    let removals = controller.check_ready(&mut scenario.clusters[0], &mut scenario.models);

    assert_eq!(names(&scenario, &removals), HashSet::from(["m8".to_string(), "m6".to_string()]));
    assert!(scenario.clusters[0].ready);
    assert_eq!(provider.request_count(), 4);
}
