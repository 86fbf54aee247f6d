use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use cycle_orchestrator::domain::clock::clock::SystemClock;
use cycle_orchestrator::domain::clock::ticker::TokioTicker;
use cycle_orchestrator::domain::utils::time::parse_cycle_string;
use cycle_orchestrator::error::Error;
use cycle_orchestrator::{build_cycle_scheduler, load_run_config, load_scenario, logger};

#[derive(Parser, Debug)]
#[command(name = "cycle-orchestrator")]
#[command(about = "Runs the forecast cycles of a scenario")]
struct Cli {
    /// Run configuration (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Scenario name, read from <main_path>/scenarios/<name>/scenario.json
    #[arg(long)]
    scenario: String,

    /// First cycle, e.g. 20240101_00z. Defaults to the scenario cycle or the current interval.
    #[arg(long)]
    cycle: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_run_config(&cli.config).with_context(|| format!("loading run configuration {}", cli.config.display()))?;
    logger::init(&config.log_dir, &config.log_level);
    log::info!("Logger initialized. Starting scenario {}.", cli.scenario);

    let cycle = cli.cycle.as_deref().map(parse_cycle_string).transpose()?;
    let scenario = load_scenario(&config, &cli.scenario).with_context(|| format!("loading scenario {}", cli.scenario))?;

    let cancel = CancellationToken::new();
    let ticker = TokioTicker::new(config.poll_interval, cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, stopping after the current tick.");
            cancel.cancel();
        }
    });

    let mut scheduler = build_cycle_scheduler(config, scenario, SystemClock::shared(), Box::new(ticker))?;

    match scheduler.start(cycle).await {
        Ok(summaries) => {
            if let Some(last) = summaries.last() {
                log::info!("Run finished after cycle {}.", last.cycle_string);
            }
            Ok(())
        }
        Err(Error::Cancelled) => {
            log::info!("Cycle scheduling cancelled.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
