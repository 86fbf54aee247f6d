use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use crate::api::scenario_dto::ScenarioDto;
use crate::domain::backend::execution_backend_trait::ExecutionBackend;
use crate::domain::clock::clock::SharedClock;
use crate::domain::clock::ticker::Ticker;
use crate::domain::cluster::boundary_value::{BoundaryValueProvider, CsvBoundaryProvider};
use crate::domain::config::RunConfig;
use crate::domain::model::model::{BoundaryKind, Model, ModelStatus};
use crate::domain::model::model_kind_registry::ModelKindRegistry;
use crate::domain::scenario::cycle_paths::CyclePaths;
use crate::domain::scenario::scenario::Scenario;
use crate::domain::scheduler::cycle::{next_cycle_time, resolve_cycle_time, start_time, Cycle};
use crate::domain::scheduler::cycle_context::{CycleContext, CycleSummary};
use crate::domain::scheduler::end_of_cycle::{standard_actions, EndOfCycleAction};
use crate::domain::scheduler::job_scheduler::{JobScheduler, TickOutcome};
use crate::domain::time_window::restart_lookup::{FileRestartLookup, RestartLookup};
use crate::domain::time_window::time_window_resolver::TimeWindowResolver;
use crate::domain::utils::statistics::ANALYTICS_TARGET;
use crate::error::Result;

pub const WEBVIEWER_ACTION: &str = "webviewer";

/// Number of cycle summaries kept by [`CycleScheduler::start`]; older ones are dropped.
pub const DEFAULT_SUMMARY_LIMIT: usize = 100;

/// The main loop: prepares a cycle, waits for its start time, ticks the job scheduler until
/// the cycle is complete and chains to the next cycle.
#[derive(Debug)]
pub struct CycleScheduler {
    config: RunConfig,
    scenario: ScenarioDto,
    backend: Box<dyn ExecutionBackend>,
    kinds: ModelKindRegistry,
    boundary: Box<dyn BoundaryValueProvider>,
    restart_lookup: Box<dyn RestartLookup>,
    actions: Vec<Box<dyn EndOfCycleAction>>,
    clock: SharedClock,
    ticker: Box<dyn Ticker>,
    summary_limit: usize,
}

impl CycleScheduler {
    pub fn new(config: RunConfig, scenario: ScenarioDto, backend: Box<dyn ExecutionBackend>, clock: SharedClock, ticker: Box<dyn Ticker>) -> Self {
        let actions = standard_actions(&config);

        CycleScheduler {
            config,
            scenario,
            backend,
            kinds: ModelKindRegistry::standard(),
            boundary: Box::new(CsvBoundaryProvider),
            restart_lookup: Box::new(FileRestartLookup),
            actions,
            clock,
            ticker,
            summary_limit: DEFAULT_SUMMARY_LIMIT,
        }
    }

    pub fn with_model_kinds(mut self, kinds: ModelKindRegistry) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn with_boundary_provider(mut self, boundary: Box<dyn BoundaryValueProvider>) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_restart_lookup(mut self, restart_lookup: Box<dyn RestartLookup>) -> Self {
        self.restart_lookup = restart_lookup;
        self
    }

    /// Appends an action, e.g. a web viewer named [`WEBVIEWER_ACTION`].
    pub fn with_end_of_cycle_action(mut self, action: Box<dyn EndOfCycleAction>) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_end_of_cycle_actions(mut self, actions: Vec<Box<dyn EndOfCycleAction>>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_summary_limit(mut self, limit: usize) -> Self {
        self.summary_limit = limit.max(1);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs cycles until one has no successor.
    ///
    /// # Returns
    /// The summaries of the most recent cycles, at most the summary limit. Each summary is
    /// logged when its cycle completes. Configuration errors and cancellation end the run.
    pub async fn start(&mut self, cycle: Option<DateTime<Utc>>) -> Result<Vec<CycleSummary>> {
        log::info!("Starting main loop ...");

        if self.config.make_webviewer && !self.actions.iter().any(|action| action.name() == WEBVIEWER_ACTION) {
            log::warn!("A web viewer was requested, but no web viewer action is configured.");
        }

        let mut explicit = cycle;
        let mut summaries = VecDeque::new();

        loop {
            let mut ctx = self.prepare_cycle(explicit)?;

            let now = self.clock.now();
            let start_at = start_time(ctx.cycle.time, &self.config, now);
            log::info!("Next cycle {} will start at {} UTC", ctx.cycle.cycle_string, start_at.format("%Y-%m-%d %H:%M:%S"));
            self.ticker.wait_until(start_at, now).await?;

            ctx.started_at = self.clock.now();
            self.run_cycle(&mut ctx).await?;
            let summary = CycleSummary::from(&ctx);
            log_summary(&summary);
            if summaries.len() == self.summary_limit {
                summaries.pop_front();
            }
            summaries.push_back(summary);

            match ctx.cycle.next {
                Some(next) => explicit = Some(next),
                None => {
                    log::info!("All done.");
                    break;
                }
            }
        }

        Ok(summaries.into())
    }

    /// Builds the model set of a cycle and resolves its time windows.
    pub fn prepare_cycle(&self, explicit: Option<DateTime<Utc>>) -> Result<CycleContext> {
        self.config.check_paths()?;

        let mut scenario = Scenario::try_from(self.scenario.clone())?;
        let now = self.clock.now();

        let time = resolve_cycle_time(explicit, scenario.cycle, now, self.config.interval_hours);
        let next = next_cycle_time(time, &self.config, scenario.last_cycle, now);
        let cycle = Cycle::new(time, scenario.runtime, next);

        log::info!("Starting cycle {} of scenario {} ...", cycle.cycle_string, scenario.long_name);
        tracing::info!(
            target: ANALYTICS_TARGET,
            LogDescription = "Cycle started",
            Cycle = %cycle.cycle_string,
            Scenario = %scenario.id,
            Models = scenario.models.len(),
            RunMode = %self.backend.run_mode(),
        );

        let paths = CyclePaths::new(&self.config.main_path, scenario.id.as_str(), time);
        paths.create_dirs()?;
        scenario.assign_paths(&paths);

        let resolver = TimeWindowResolver::new(self.restart_lookup.as_ref());
        let reference_date = resolver.resolve(&mut scenario.models, cycle.time, cycle.stop);
        for (_, model) in scenario.models.iter() {
            log_windows(model);
        }

        let resumed = scenario.resume_from_job_list(&paths);
        if resumed > 0 {
            log::info!("Resuming cycle {}: {} model(s) already finished.", cycle.cycle_string, resumed);
        }

        let mut ctx = CycleContext::new(cycle, scenario, paths, now);
        ctx.reference_date = reference_date;
        Ok(ctx)
    }

    async fn run_cycle(&mut self, ctx: &mut CycleContext) -> Result<()> {
        let scheduler = JobScheduler::new(self.backend.as_ref(), &self.kinds, self.boundary.as_ref(), &self.actions, self.clock.as_ref());

        loop {
            if scheduler.tick(ctx).await == TickOutcome::CycleComplete {
                return Ok(());
            }
            self.ticker.tick().await?;
        }
    }
}

fn log_summary(summary: &CycleSummary) {
    let failed = summary.statuses.iter().filter(|(_, status)| *status == ModelStatus::Failed).count();
    log::info!(
        "Cycle {}: {} model(s), {} failed, {} removed by clusters.",
        summary.cycle_string,
        summary.statuses.len(),
        failed,
        summary.removed.len()
    );
}

fn log_windows(model: &Model) {
    for kind in BoundaryKind::TIMED {
        if !model.has_kind(kind) {
            continue;
        }
        let Some(window) = model.windows.get(kind) else {
            continue;
        };

        let restart = match window.restart.as_ref().and_then(|r| r.path.file_name()) {
            Some(name) => format!("restart file : {}", name.to_string_lossy()),
            None => "no restart file".to_string(),
        };
        log::info!(
            "{} ({}) : {} - {} ({})",
            model.long_name,
            kind,
            window.start.format("%Y%m%d %H%M%S"),
            window.stop.format("%Y%m%d %H%M%S"),
            restart
        );
    }
}
