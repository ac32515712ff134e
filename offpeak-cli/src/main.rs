//! Offpeak CLI - Command-line interface
//!
//! This binary provides a command-line interface to the offpeak library:
//! `run` executes a batch of generated tasks under the live concurrency
//! limit, `limit` evaluates the time-of-day policy for the current moment.

mod error;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use offpeak::config::Settings;
use offpeak::logging::{LoggingGuard, default_log_file, init_logging, init_logging_with_file};
use offpeak::scheduler::{
    BatchController, SchedulerConfig, TimeOfDaySource, TracingTelemetrySink,
    DEFAULT_MAX_TASK_DELAY_MS, DEFAULT_OFFPEAK_LIMIT, DEFAULT_PEAK_END_HOUR, DEFAULT_PEAK_LIMIT,
    DEFAULT_PEAK_START_HOUR, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TASK_COUNT,
};
use offpeak::time::{HourWindow, local_hour};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "offpeak")]
#[command(version = offpeak::VERSION)]
#[command(about = "Run task batches under a time-driven concurrency limit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a batch of generated tasks under the live concurrency limit
    Run(RunArgs),
    /// Show the limit the time-of-day policy yields right now
    Limit(LimitArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Number of tasks in the generated batch
    #[arg(long, default_value_t = DEFAULT_TASK_COUNT)]
    tasks: usize,

    /// Concurrency ceiling during peak hours
    #[arg(long, default_value_t = DEFAULT_PEAK_LIMIT)]
    peak_limit: usize,

    /// Concurrency ceiling outside peak hours
    #[arg(long, default_value_t = DEFAULT_OFFPEAK_LIMIT)]
    offpeak_limit: usize,

    /// First hour (inclusive, local time) of the peak window
    #[arg(long, default_value_t = DEFAULT_PEAK_START_HOUR)]
    peak_start: u32,

    /// End hour (exclusive, local time) of the peak window
    #[arg(long, default_value_t = DEFAULT_PEAK_END_HOUR)]
    peak_end: u32,

    /// Seconds between re-samples of the concurrency limit
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    poll_interval: u64,

    /// Upper bound in milliseconds of each task's simulated work time
    #[arg(long, default_value_t = DEFAULT_MAX_TASK_DELAY_MS)]
    max_task_delay: u64,

    /// Pin the concurrency ceiling, ignoring the time-of-day policy
    #[arg(long)]
    fixed_limit: Option<usize>,

    /// Write a session log file into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Enable debug-level logging regardless of RUST_LOG
    #[arg(long)]
    debug: bool,
}

impl RunArgs {
    fn to_settings(&self) -> Settings {
        let mut settings = Settings::default();

        settings.scheduler.poll_interval_secs = self.poll_interval;
        settings.scheduler.peak_start_hour = self.peak_start;
        settings.scheduler.peak_end_hour = self.peak_end;
        settings.scheduler.peak_limit = self.peak_limit;
        settings.scheduler.offpeak_limit = self.offpeak_limit;
        settings.scheduler.fixed_limit = self.fixed_limit;
        settings.batch.task_count = self.tasks;
        settings.batch.max_task_delay_ms = self.max_task_delay;
        settings.logging.level = if self.debug { "debug" } else { "info" }.to_string();
        settings.logging.directory = self.log_dir.clone();

        settings
    }
}

#[derive(Args)]
struct LimitArgs {
    /// Concurrency ceiling during peak hours
    #[arg(long, default_value_t = DEFAULT_PEAK_LIMIT)]
    peak_limit: usize,

    /// Concurrency ceiling outside peak hours
    #[arg(long, default_value_t = DEFAULT_OFFPEAK_LIMIT)]
    offpeak_limit: usize,

    /// First hour (inclusive, local time) of the peak window
    #[arg(long, default_value_t = DEFAULT_PEAK_START_HOUR)]
    peak_start: u32,

    /// End hour (exclusive, local time) of the peak window
    #[arg(long, default_value_t = DEFAULT_PEAK_END_HOUR)]
    peak_end: u32,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            if let Err(error) = run_batch(args).await {
                error.exit();
            }
        }
        Command::Limit(args) => show_limit(args),
    }
}

/// Run a batch of demo tasks and print the final report.
async fn run_batch(args: RunArgs) -> Result<(), CliError> {
    let settings = args.to_settings();
    let _logging_guard = init_cli_logging(&settings)?;

    info!("offpeak v{}", offpeak::VERSION);

    let config = SchedulerConfig::from(&settings);
    let controller = BatchController::new(config).with_telemetry(Arc::new(TracingTelemetrySink));
    let batch = controller.demo_batch();

    // Ctrl-C interrupts the batch instead of killing the process outright.
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, interrupting batch");
            signal_token.cancel();
        }
    });

    let report = controller
        .run(batch, shutdown)
        .await
        .map_err(CliError::Batch)?;

    println!(
        "Batch finished: {}/{} tasks succeeded in {:.2}s",
        report.succeeded,
        report.submitted,
        report.duration.as_secs_f64()
    );
    for failure in &report.failed {
        println!("  failed {}: {}", failure.task_id, failure.error);
    }

    Ok(())
}

/// Evaluate the time-of-day policy for the current local hour.
fn show_limit(args: LimitArgs) {
    let window = HourWindow::new(args.peak_start, args.peak_end);
    let source = TimeOfDaySource::new(window, args.peak_limit, args.offpeak_limit);

    let hour = local_hour();
    let limit = source.limit_for_hour(hour);
    let phase = if window.contains(hour) {
        "peak"
    } else {
        "off-peak"
    };

    println!("Local hour {hour:02}:00 is {phase} (peak window {window})");
    println!("Concurrency limit now: {limit}");
}

fn init_cli_logging(settings: &Settings) -> Result<LoggingGuard, CliError> {
    let level = settings.logging.level.as_str();

    match &settings.logging.directory {
        Some(dir) => init_logging_with_file(level, &dir.to_string_lossy(), default_log_file())
            .map_err(CliError::LoggingInit),
        None => Ok(init_logging(level)),
    }
}
