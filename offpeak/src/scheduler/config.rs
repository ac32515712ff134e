//! Scheduler configuration.
//!
//! This module contains the [`SchedulerConfig`] struct and the default
//! constants of the reference policy.

use crate::time::HourWindow;
use std::time::Duration;

// =============================================================================
// Configuration Constants
// =============================================================================

/// Default interval between limit re-samples, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default first hour (inclusive) of the peak window.
pub const DEFAULT_PEAK_START_HOUR: u32 = 9;

/// Default end hour (exclusive) of the peak window.
pub const DEFAULT_PEAK_END_HOUR: u32 = 17;

/// Default concurrency ceiling inside the peak window.
pub const DEFAULT_PEAK_LIMIT: usize = 4;

/// Default concurrency ceiling outside the peak window.
pub const DEFAULT_OFFPEAK_LIMIT: usize = 20;

/// Default number of tasks in the generated demo batch.
pub const DEFAULT_TASK_COUNT: usize = 20;

/// Default exclusive upper bound of the demo executor's simulated work
/// time, in milliseconds.
pub const DEFAULT_MAX_TASK_DELAY_MS: u64 = 200;

// =============================================================================
// Scheduler Configuration
// =============================================================================

/// Configuration for a batch run.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// How often the monitor re-samples the limit source.
    pub poll_interval: Duration,

    /// Local-hour window in which the peak limit applies.
    pub peak_window: HourWindow,

    /// Concurrency ceiling inside the peak window.
    pub peak_limit: usize,

    /// Concurrency ceiling outside the peak window.
    pub offpeak_limit: usize,

    /// Pin the ceiling to a fixed value, bypassing the time-of-day policy.
    pub fixed_limit: Option<usize>,

    /// Number of tasks in the generated demo batch.
    pub task_count: usize,

    /// Exclusive upper bound of the demo executor's simulated work time.
    pub max_task_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            peak_window: HourWindow::new(DEFAULT_PEAK_START_HOUR, DEFAULT_PEAK_END_HOUR),
            peak_limit: DEFAULT_PEAK_LIMIT,
            offpeak_limit: DEFAULT_OFFPEAK_LIMIT,
            fixed_limit: None,
            task_count: DEFAULT_TASK_COUNT,
            max_task_delay: Duration::from_millis(DEFAULT_MAX_TASK_DELAY_MS),
        }
    }
}

impl From<&crate::config::Settings> for SchedulerConfig {
    fn from(settings: &crate::config::Settings) -> Self {
        Self {
            poll_interval: Duration::from_secs(settings.scheduler.poll_interval_secs),
            peak_window: HourWindow::new(
                settings.scheduler.peak_start_hour,
                settings.scheduler.peak_end_hour,
            ),
            peak_limit: settings.scheduler.peak_limit,
            offpeak_limit: settings.scheduler.offpeak_limit,
            fixed_limit: settings.scheduler.fixed_limit,
            task_count: settings.batch.task_count,
            max_task_delay: Duration::from_millis(settings.batch.max_task_delay_ms),
        }
    }
}
