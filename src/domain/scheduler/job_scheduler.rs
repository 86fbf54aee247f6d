use crate::domain::backend::execution_backend_trait::{ConcurrencyPolicy, ExecutionBackend, JobPoll, JobSpec};
use crate::domain::backend::sentinel::write_job_list_sentinel;
use crate::domain::clock::clock::Clock;
use crate::domain::cluster::boundary_value::BoundaryValueProvider;
use crate::domain::cluster::cluster_admission::ClusterAdmissionController;
use crate::domain::model::model::{BoundaryKind, Model, ModelStatus};
use crate::domain::model::model_kind_registry::ModelKindRegistry;
use crate::domain::model::model_kind_trait::NestingSource;
use crate::domain::model::model_store::ModelKey;
use crate::domain::scheduler::cycle_context::CycleContext;
use crate::domain::scheduler::end_of_cycle::EndOfCycleAction;
use crate::domain::utils::statistics::ANALYTICS_TARGET;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    InProgress,
    /// Every model is finished or failed and the end-of-cycle actions ran.
    CycleComplete,
}

/// The model loop of one cycle.
///
/// A tick never blocks on a job: running jobs are polled once and simply show up again on
/// the next tick. Only dependency failures change the fate of a model, every other error
/// is logged and confined to the step it occurred in.
#[derive(Debug)]
pub struct JobScheduler<'a> {
    backend: &'a dyn ExecutionBackend,
    kinds: &'a ModelKindRegistry,
    boundary: &'a dyn BoundaryValueProvider,
    actions: &'a [Box<dyn EndOfCycleAction>],
    clock: &'a dyn Clock,
}

impl<'a> JobScheduler<'a> {
    pub fn new(
        backend: &'a dyn ExecutionBackend,
        kinds: &'a ModelKindRegistry,
        boundary: &'a dyn BoundaryValueProvider,
        actions: &'a [Box<dyn EndOfCycleAction>],
        clock: &'a dyn Clock,
    ) -> Self {
        JobScheduler { backend, kinds, boundary, actions, clock }
    }

    /// Runs one pass of the model loop.
    ///
    /// # Returns
    /// [`TickOutcome::CycleComplete`] once all models are terminal. End-of-cycle actions run
    /// on the first such tick only.
    pub async fn tick(&self, ctx: &mut CycleContext) -> TickOutcome {
        ctx.ticks += 1;
        if ctx.completed {
            return TickOutcome::CycleComplete;
        }

        // Phase 1: which running jobs are done.
        let finished = self.detect_finished(ctx).await;

        // Phase 2: archive their output so that nested models can be prepared right away.
        self.move_finished(ctx, &finished);

        // Phase 3: clusters decide which members are worth running.
        self.evaluate_clusters(ctx);

        // Phase 4 + 5: admissible models, bounded by the concurrency policy of the backend.
        let waiting = self.waiting_list(ctx);
        let admitted = self.admit(ctx, waiting);

        // Phase 6
        for key in admitted {
            self.submit(ctx, key).await;
        }

        // Phase 7
        self.post_process(ctx, &finished);

        // Phase 8
        self.check_complete(ctx)
    }

    async fn detect_finished(&self, ctx: &CycleContext) -> Vec<(ModelKey, Option<String>)> {
        let mut finished = Vec::new();

        for (key, model) in ctx.scenario.models.iter() {
            if model.status != ModelStatus::Running {
                continue;
            }

            let Some(handle) = &model.job else {
                log::warn!("Model {} is running without a job handle.", model.id);
                continue;
            };

            match self.backend.poll(handle).await {
                Ok(JobPoll::Done { worker }) => finished.push((key, worker)),
                Ok(JobPoll::Running) => {}
                Err(e) => log::error!("Could not poll model {}, trying again next tick: {}", model.id, e),
            }
        }

        finished
    }

    fn move_finished(&self, ctx: &mut CycleContext, finished: &[(ModelKey, Option<String>)]) {
        let cycle = ctx.cycle.cycle_string.clone();

        for (key, worker) in finished {
            let Some(model) = ctx.scenario.models.get_mut(*key) else {
                continue;
            };
            if model.status == ModelStatus::Failed {
                continue;
            }

            log::info!("Moving model {}", model.long_name);
            match self.kinds.get(model.model_type) {
                Some(kind) => {
                    if let Err(e) = kind.move_output(model) {
                        log::error!("Moving output of model {} failed: {}", model.id, e);
                    }
                }
                None => log::error!("No model kind registered for type {}, output of model {} stays in place.", model.model_type, model.id),
            }

            model.executed_by = worker.clone();
            model.job = None;
            transition(&cycle, model, ModelStatus::SimulationFinished);
        }
    }

    fn evaluate_clusters(&self, ctx: &mut CycleContext) {
        let controller = ClusterAdmissionController::new(self.boundary);
        let scenario = &mut ctx.scenario;

        let mut removals = Vec::new();
        for cluster in scenario.clusters.iter_mut() {
            removals.extend(controller.check_ready(cluster, &mut scenario.models));
        }

        for key in removals {
            if let Some(model) = scenario.models.remove(key) {
                tracing::info!(
                    target: ANALYTICS_TARGET,
                    LogDescription = "Model removed by cluster",
                    Cycle = %ctx.cycle.cycle_string,
                    ModelName = %model.id,
                    Cluster = %model.cluster.as_ref().map(|c| c.to_string()).unwrap_or_default(),
                );
                ctx.removed.push(model.id);
            }
        }
    }

    /// Cascades dependency failures and collects the models ready to run, highest priority first.
    fn waiting_list(&self, ctx: &mut CycleContext) -> Vec<(ModelKey, i32)> {
        let cycle = ctx.cycle.cycle_string.clone();
        let models = &mut ctx.scenario.models;

        loop {
            let failed: Vec<ModelKey> = models
                .iter()
                .filter(|(_, model)| model.status == ModelStatus::Waiting)
                .filter(|(_, model)| {
                    model.parent_keys().any(|parent| models.get(parent).map(|p| p.status == ModelStatus::Failed).unwrap_or(true))
                })
                .map(|(key, _)| key)
                .collect();

            if failed.is_empty() {
                break;
            }

            for key in failed {
                if let Some(model) = models.get_mut(key) {
                    log::warn!("Model {} fails because one of the models it is nested in failed.", model.id);
                    transition(&cycle, model, ModelStatus::Failed);
                }
            }
        }

        let models = &ctx.scenario.models;
        let mut waiting: Vec<(ModelKey, i32)> = models
            .iter()
            .filter(|(_, model)| model.status == ModelStatus::Waiting)
            .filter(|(_, model)| model.parent_keys().all(|parent| models.get(parent).map(|p| p.status == ModelStatus::Finished).unwrap_or(false)))
            .filter(|(key, _)| ctx.scenario.cluster_of(*key).map(|cluster| cluster.admits(*key)).unwrap_or(true))
            .map(|(key, model)| (key, model.priority))
            .collect();

        waiting.sort_by(|a, b| b.1.cmp(&a.1));
        waiting
    }

    fn admit(&self, ctx: &CycleContext, waiting: Vec<(ModelKey, i32)>) -> Vec<ModelKey> {
        match self.backend.concurrency() {
            ConcurrencyPolicy::OneAtATime => {
                let busy = ctx.scenario.models.iter().any(|(_, model)| model.status == ModelStatus::Running);
                if busy {
                    Vec::new()
                } else {
                    waiting.into_iter().take(1).map(|(key, _)| key).collect()
                }
            }
            ConcurrencyPolicy::TopPriorityTier => match waiting.first().map(|(_, priority)| *priority) {
                Some(top) => waiting.into_iter().filter(|(_, priority)| *priority == top).map(|(key, _)| key).collect(),
                None => Vec::new(),
            },
            ConcurrencyPolicy::Unbounded => waiting.into_iter().map(|(key, _)| key).collect(),
        }
    }

    fn prepare(&self, ctx: &CycleContext, key: ModelKey) -> Result<JobSpec> {
        let models = &ctx.scenario.models;
        let model = models
            .get(key)
            .ok_or_else(|| Error::PreProcessError { model: format!("{:?}", key), reason: "model left the active set".to_string() })?;

        let kind = self.kinds.get(model.model_type).ok_or_else(|| Error::PreProcessError {
            model: model.id.to_string(),
            reason: format!("no model kind registered for type {}", model.model_type),
        })?;

        let nesting: Vec<NestingSource<'_>> = BoundaryKind::ALL
            .into_iter()
            .filter_map(|kind| model.parents.get(kind).and_then(|parent| models.get(parent)).map(|parent| NestingSource { kind, parent }))
            .collect();

        log::info!("Pre-processing {} ...", model.long_name);
        kind.pre_process(model, &nesting, &ctx.cycle.cycle_string)?;

        Ok(kind.job_spec(model, &ctx.cycle.cycle_string))
    }

    async fn submit(&self, ctx: &mut CycleContext, key: ModelKey) {
        let cycle = ctx.cycle.cycle_string.clone();

        let spec = match self.prepare(ctx, key) {
            Ok(spec) => spec,
            Err(e) => {
                log::error!("{}", e);
                if let Some(model) = ctx.scenario.models.get_mut(key) {
                    transition(&cycle, model, ModelStatus::Failed);
                }
                return;
            }
        };

        let Some(model) = ctx.scenario.models.get(key) else {
            return;
        };

        log::info!("Submitting {} ...", model.long_name);
        let submitted = self.backend.submit(model, &spec).await;

        let Some(model) = ctx.scenario.models.get_mut(key) else {
            return;
        };
        match submitted {
            Ok(handle) => {
                tracing::info!(
                    target: ANALYTICS_TARGET,
                    LogDescription = "Job submitted",
                    Cycle = %cycle,
                    ModelName = %model.id,
                    RunMode = %handle.run_mode,
                    Priority = model.priority,
                );
                model.job = Some(handle);
                transition(&cycle, model, ModelStatus::Running);
            }
            Err(e) => log::error!("Submission of model {} failed, trying again next tick: {}", model.id, e),
        }
    }

    fn post_process(&self, ctx: &mut CycleContext, finished: &[(ModelKey, Option<String>)]) {
        let cycle = ctx.cycle.cycle_string.clone();

        for (key, _) in finished {
            let Some(model) = ctx.scenario.models.get_mut(*key) else {
                continue;
            };
            if model.status != ModelStatus::SimulationFinished {
                continue;
            }

            log::info!("Post-processing {} ...", model.long_name);
            match self.kinds.get(model.model_type) {
                Some(kind) => {
                    if let Err(e) = kind.post_process(model) {
                        log::error!("{} Model is marked as finished regardless.", e);
                    }
                }
                None => log::error!("No model kind registered for type {}, skipping post-processing of {}.", model.model_type, model.id),
            }

            match &model.executed_by {
                Some(worker) => log::info!("{} was run by {}", model.long_name, worker),
                None => log::info!("{} finished", model.long_name),
            }

            let sentinel = ctx.paths.job_list_sentinel(&model.id);
            if let Err(e) = write_job_list_sentinel(&sentinel, model.executed_by.as_deref()) {
                log::error!("Could not write job list entry {}: {}", sentinel.display(), e);
            }

            transition(&cycle, model, ModelStatus::Finished);
        }
    }

    fn check_complete(&self, ctx: &mut CycleContext) -> TickOutcome {
        if !ctx.scenario.all_terminal() {
            return TickOutcome::InProgress;
        }

        let now = self.clock.now();
        ctx.finished_at = Some(now);
        log::info!("All models of cycle {} finished!", ctx.cycle.cycle_string);

        for action in self.actions {
            if let Err(e) = action.run(ctx) {
                let e = match e {
                    Error::EndOfCycleError { .. } => e,
                    other => Error::EndOfCycleError { action: action.name().to_string(), reason: other.to_string() },
                };
                log::error!("{}", e);
            }
        }

        let failed = ctx.scenario.models.iter().filter(|(_, model)| model.status == ModelStatus::Failed).count();
        tracing::info!(
            target: ANALYTICS_TARGET,
            LogDescription = "Cycle finished",
            Cycle = %ctx.cycle.cycle_string,
            Scenario = %ctx.scenario.id,
            Models = ctx.scenario.models.len(),
            Failed = failed,
            Removed = ctx.removed.len(),
            DurationS = (now - ctx.started_at).num_seconds(),
        );

        ctx.completed = true;
        TickOutcome::CycleComplete
    }
}

fn transition(cycle: &str, model: &mut Model, status: ModelStatus) {
    if model.set_status(status) {
        tracing::info!(
            target: ANALYTICS_TARGET,
            LogDescription = "Model status changed",
            Cycle = %cycle,
            ModelName = %model.id,
            Status = %status,
        );
    }
}
