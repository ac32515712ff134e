//! Application settings.
//!
//! Pure data types describing a batch run. Each struct covers one concern;
//! the CLI populates them from flags and [`SchedulerConfig`] is derived via
//! `From<&Settings>`.
//!
//! [`SchedulerConfig`]: crate::scheduler::SchedulerConfig

use std::path::PathBuf;

use crate::scheduler::{
    DEFAULT_MAX_TASK_DELAY_MS, DEFAULT_OFFPEAK_LIMIT, DEFAULT_PEAK_END_HOUR,
    DEFAULT_PEAK_LIMIT, DEFAULT_PEAK_START_HOUR, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TASK_COUNT,
};

/// Complete application configuration for a batch run.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Scheduler settings (limit policy and monitor cadence)
    pub scheduler: SchedulerSettings,
    /// Batch settings (demo workload shape)
    pub batch: BatchSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Scheduler configuration: the concurrency limit policy and how often it
/// is re-sampled.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Interval in seconds between limit re-samples.
    /// Default: 5
    pub poll_interval_secs: u64,
    /// First hour (inclusive, local time) of the peak window.
    /// Default: 9
    pub peak_start_hour: u32,
    /// End hour (exclusive, local time) of the peak window.
    /// Default: 17
    pub peak_end_hour: u32,
    /// Concurrency ceiling inside the peak window.
    /// Default: 4
    pub peak_limit: usize,
    /// Concurrency ceiling outside the peak window.
    /// Default: 20
    pub offpeak_limit: usize,
    /// Pin the ceiling to a fixed value, ignoring the time-of-day policy.
    /// Default: None
    pub fixed_limit: Option<usize>,
}

/// Demo workload configuration.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Number of tasks in the generated batch.
    /// Default: 20
    pub task_count: usize,
    /// Upper bound in milliseconds (exclusive) of each task's simulated
    /// work time.
    /// Default: 200
    pub max_task_delay_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Log level used when `RUST_LOG` is not set.
    /// Default: "info"
    pub level: String,
    /// Directory for the session log file; `None` disables file logging.
    /// Default: None
    pub directory: Option<PathBuf>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            peak_start_hour: DEFAULT_PEAK_START_HOUR,
            peak_end_hour: DEFAULT_PEAK_END_HOUR,
            peak_limit: DEFAULT_PEAK_LIMIT,
            offpeak_limit: DEFAULT_OFFPEAK_LIMIT,
            fixed_limit: None,
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            task_count: DEFAULT_TASK_COUNT,
            max_task_delay_ms: DEFAULT_MAX_TASK_DELAY_MS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
