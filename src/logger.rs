use chrono::Utc;
use fern::Dispatch;
use log::LevelFilter;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

const LOG_FILE: &str = "orchestrator.log";

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global logger.
///
/// Log records go to the colored console (stderr) and are appended to
/// `<log_dir>/orchestrator.log`. The level is taken from `RUST_LOG`, falling back to
/// `default_level` (e.g. `info`). Lifecycle events emitted through `tracing` on the
/// analytics target end up in the same sink.
///
/// Only the first call installs the dispatcher, later calls just warn.
pub fn init(log_dir: &Path, default_level: &str) {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        log::warn!("Logger already initialized, ignoring second initialization.");
        return;
    }

    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("Failed to create log directory at '{}': {}", log_dir.display(), e);
    }

    let log_file_path = log_dir.join(LOG_FILE);

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    let log_level_filter = log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);

    let base_config = Dispatch::new()
        .level(log_level_filter)
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("hyper", LevelFilter::Warn);

    let console_config = Dispatch::new()
        .format(|out, message, record| {
            let colors = fern::colors::ColoredLevelConfig::new()
                .error(fern::colors::Color::Red)
                .warn(fern::colors::Color::Yellow)
                .info(fern::colors::Color::Green)
                .debug(fern::colors::Color::Blue)
                .trace(fern::colors::Color::BrightBlack);

            out.finish(format_args!(
                "[{} UTC {} {}] {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = base_config.chain(console_config);

    // The file sink is append-only, a cycle never truncates the log of a previous one.
    match fern::log_file(&log_file_path) {
        Ok(file) => {
            let file_config = Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "[{} UTC {} {}] {}",
                        Utc::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(file);
            dispatch = dispatch.chain(file_config);
        }
        Err(e) => {
            eprintln!("Failed to open log file '{}': {}", log_file_path.display(), e);
        }
    }

    if let Err(e) = dispatch.apply() {
        eprintln!("Failed to apply logger configuration: {}", e);
        return;
    }

    log::info!("Logger initialized. Logging to console and '{}'.", log_file_path.display());
}
