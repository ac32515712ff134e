//! Batch Scheduler
//!
//! This module provides a bounded-concurrency batch scheduler whose
//! concurrency ceiling can change at runtime, driven by an external signal
//! such as the time of day.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      BatchController                        │
//! │  Build the batch, start the loops, await the report         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        Dispatcher                           │
//! │  Main event loop: admit tasks, fold in completions          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌───────────────┐  ┌─────────────────┐   │
//! │  │ LimitMonitor │  │ LimitSource   │  │ Telemetry       │   │
//! │  │ (publisher)  │  │ (policy)      │  │ Sink            │   │
//! │  └──────────────┘  └───────────────┘  └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Task**: a named unit of work. A [`TaskExecutor`] runs it and yields
//!   a [`TaskOutcome`]; the stock [`SleepExecutor`] simulates work with a
//!   random delay.
//!
//! - **Concurrency limit**: how many tasks may be in flight at once.
//!   Carried on a `tokio::sync::watch` channel; the dispatch loop holds
//!   the receiver and re-runs admission on every publish, so a raised
//!   limit opens slots without waiting for a completion.
//!
//! - **Limit source**: where the limit comes from. [`TimeOfDaySource`]
//!   implements the time-of-day policy (a small ceiling during office
//!   hours, a large one otherwise); [`FixedLimitSource`] pins it.
//!
//! - **Limit monitor**: a periodic daemon re-sampling the source and
//!   publishing changes for as long as the batch runs.
//!
//! # Example
//!
//! ```ignore
//! use offpeak::scheduler::{BatchController, SchedulerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let controller = BatchController::new(SchedulerConfig::default());
//! let batch = controller.demo_batch();
//!
//! let report = controller.run(batch, CancellationToken::new()).await?;
//! println!("{} of {} tasks succeeded", report.succeeded, report.submitted);
//! ```
//!
//! # Telemetry
//!
//! The scheduler emits structured events via the [`TelemetrySink`] trait:
//! batch start/end, per-task admission and completion, and limit changes.
//! [`TracingTelemetrySink`] renders them as log lines.

// Module declarations
mod batch;
mod config;
mod error;
mod handle;
mod limit;
mod monitor;
mod task;
mod telemetry;

// Dispatch loop - split into focused modules
mod core;
mod dispatch;
mod lifecycle;

// Re-export public types

// Controller
pub use batch::BatchController;

// Configuration
pub use config::{
    SchedulerConfig, DEFAULT_MAX_TASK_DELAY_MS, DEFAULT_OFFPEAK_LIMIT, DEFAULT_PEAK_END_HOUR,
    DEFAULT_PEAK_LIMIT, DEFAULT_PEAK_START_HOUR, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TASK_COUNT,
};

// Errors
pub use error::SchedulerError;

// Handle and report
pub use handle::{BatchHandle, BatchReport, BatchStatus, FailedTask};

// Limit sources
pub use limit::{FixedLimitSource, LimitSource, LimitSourceError, TimeOfDaySource};

// Limit monitor
pub use monitor::LimitMonitor;

// Task types
pub use task::{SleepExecutor, Task, TaskError, TaskExecutor, TaskId, TaskOutcome};

// Telemetry
pub use telemetry::{
    MultiplexTelemetrySink, NullTelemetrySink, TelemetryEvent, TelemetrySink, TracingTelemetrySink,
};
