//! Batch orchestration.
//!
//! [`BatchController`] wires one batch run together: it samples the initial
//! concurrency limit, starts the limit monitor and the dispatch loop as
//! background tasks, waits for the batch to resolve, and returns the report.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       BatchController                        │
//! │                                                              │
//! │  ┌──────────────┐   watch<usize>    ┌────────────────────┐   │
//! │  │ LimitMonitor │ ────────────────► │     Dispatcher     │   │
//! │  │ (background) │                   │    (background)    │   │
//! │  └──────┬───────┘                   └─────────┬──────────┘   │
//! │         │ polls                               │ spawns       │
//! │  ┌──────┴───────┐                   ┌─────────┴──────────┐   │
//! │  │ LimitSource  │                   │    TaskExecutor    │   │
//! │  └──────────────┘                   └────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The monitor runs on a child of the caller's shutdown token. The
//! controller cancels that child as soon as the batch resolves, so the
//! limit source is never sampled past the end of the run.

use super::config::SchedulerConfig;
use super::core::Dispatcher;
use super::error::SchedulerError;
use super::handle::BatchReport;
use super::limit::{FixedLimitSource, LimitSource, TimeOfDaySource};
use super::monitor::LimitMonitor;
use super::task::{SleepExecutor, Task, TaskExecutor, TaskId};
use super::telemetry::{NullTelemetrySink, TelemetryEvent, TelemetrySink};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Orchestrates a single batch run.
///
/// The stock controller executes tasks with [`SleepExecutor`] and follows
/// the local clock through [`TimeOfDaySource`]; both can be swapped out
/// with the builder methods. One controller can run any number of batches,
/// one at a time.
pub struct BatchController {
    config: SchedulerConfig,
    executor: Arc<dyn TaskExecutor>,
    source: Arc<dyn LimitSource>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl BatchController {
    /// Creates a controller with the stock pieces for `config`.
    ///
    /// When `config.fixed_limit` is set the time-of-day policy is bypassed
    /// and the limit never moves.
    pub fn new(config: SchedulerConfig) -> Self {
        let source: Arc<dyn LimitSource> = match config.fixed_limit {
            Some(limit) => Arc::new(FixedLimitSource::new(limit)),
            None => Arc::new(TimeOfDaySource::new(
                config.peak_window,
                config.peak_limit,
                config.offpeak_limit,
            )),
        };

        Self {
            executor: Arc::new(SleepExecutor::new(config.max_task_delay)),
            source,
            telemetry: Arc::new(NullTelemetrySink),
            config,
        }
    }

    /// Replaces the task executor.
    pub fn with_executor(mut self, executor: Arc<dyn TaskExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Replaces the concurrency limit source.
    pub fn with_limit_source(mut self, source: Arc<dyn LimitSource>) -> Self {
        self.source = source;
        self
    }

    /// Attaches a telemetry sink observing batch progress.
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Builds the demonstration batch: `config.task_count` tasks with
    /// random names.
    pub fn demo_batch(&self) -> Vec<Task> {
        (0..self.config.task_count)
            .map(|_| Task::new(TaskId::random()))
            .collect()
    }

    /// Runs `tasks` to completion under the live concurrency limit.
    ///
    /// Samples the initial limit (a failure here aborts the run, there is
    /// no previous value to fall back on), starts the limit monitor and
    /// the dispatch loop, and waits for the batch to resolve. Cancelling
    /// `shutdown` interrupts the run and surfaces as
    /// [`SchedulerError::Interrupted`].
    pub async fn run(
        &self,
        tasks: Vec<Task>,
        shutdown: CancellationToken,
    ) -> Result<BatchReport, SchedulerError> {
        let sampled = self.source.current_limit()?;
        let initial_limit = sampled.max(1);
        if initial_limit != sampled {
            warn!("Limit source reported 0 at batch start, using 1");
        }

        info!(
            task_count = tasks.len(),
            initial_limit, "Starting batch run"
        );

        self.telemetry.emit(TelemetryEvent::BatchStarted {
            task_count: tasks.len(),
            task_names: tasks.iter().map(|t| t.id().as_str().to_string()).collect(),
            initial_limit,
        });

        let (limit_tx, limit_rx) = watch::channel(initial_limit);

        // The monitor lives on a child token so it can be stopped the
        // moment the batch resolves, while still honouring the caller's
        // shutdown.
        let monitor_shutdown = shutdown.child_token();
        let monitor = LimitMonitor::new(
            Arc::clone(&self.source),
            limit_tx,
            Arc::clone(&self.telemetry),
        )
        .with_poll_interval(self.config.poll_interval);
        let monitor_handle = tokio::spawn(monitor.run(monitor_shutdown.clone()));

        let (dispatcher, mut handle) = Dispatcher::with_telemetry(
            tasks,
            limit_rx,
            Arc::clone(&self.executor),
            Arc::clone(&self.telemetry),
        );
        let dispatcher_handle = tokio::spawn(dispatcher.run(shutdown.clone()));

        let result = handle.wait().await;

        // The batch is resolved either way; the monitor has nothing left
        // to steer.
        monitor_shutdown.cancel();
        if let Err(error) = monitor_handle.await {
            error!(%error, "Limit monitor task panicked");
        }
        if let Err(error) = dispatcher_handle.await {
            error!(%error, "Dispatch loop task panicked");
        }

        match &result {
            Ok(report) => info!(
                succeeded = report.succeeded,
                failed = report.failed.len(),
                duration_ms = report.duration.as_millis(),
                "Batch run finished"
            ),
            Err(error) => warn!(%error, "Batch run did not complete"),
        }

        result
    }
}

impl std::fmt::Debug for BatchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
