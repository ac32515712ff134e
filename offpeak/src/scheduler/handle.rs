//! Batch handle for status queries and awaiting completion.
//!
//! A [`BatchHandle`] is created when a batch starts. It provides a
//! non-blocking status query and an awaitable completion that yields the
//! final [`BatchReport`].
//!
//! # Example
//!
//! ```ignore
//! use offpeak::scheduler::{BatchHandle, BatchStatus};
//!
//! if handle.status() == BatchStatus::Running {
//!     println!("batch still in flight");
//! }
//!
//! let report = handle.wait().await?;
//! println!("{} succeeded, {} failed", report.succeeded, report.failed.len());
//! ```

use super::error::SchedulerError;
use super::task::{TaskError, TaskId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};

/// Handle to a running batch.
///
/// Cloneable; all clones observe the same batch. The final report is
/// consumed by the first `wait()` to return, later waiters receive an
/// empty report.
#[derive(Clone)]
pub struct BatchHandle {
    status_rx: watch::Receiver<BatchStatus>,
    report: Arc<Mutex<Option<BatchReport>>>,
}

impl BatchHandle {
    /// Creates a handle observing the given status channel.
    pub(crate) fn new(status_rx: watch::Receiver<BatchStatus>) -> Self {
        Self {
            status_rx,
            report: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns a clone of the report holder for the dispatcher to fill.
    pub(crate) fn report_holder(&self) -> Arc<Mutex<Option<BatchReport>>> {
        Arc::clone(&self.report)
    }

    /// The current batch status, without waiting.
    pub fn status(&self) -> BatchStatus {
        *self.status_rx.borrow()
    }

    /// Waits until the batch reaches a terminal state.
    ///
    /// Returns the final report once every task has finished.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Interrupted`] if the scheduler shut down
    /// before the batch completed.
    pub async fn wait(&mut self) -> Result<BatchReport, SchedulerError> {
        loop {
            match self.status() {
                BatchStatus::Completed => break,
                BatchStatus::Interrupted => return Err(SchedulerError::Interrupted),
                BatchStatus::Running => {}
            }
            if self.status_rx.changed().await.is_err() {
                // Dispatcher dropped without publishing a terminal status
                return Err(SchedulerError::Interrupted);
            }
        }
        let report = self.report.lock().await.take().unwrap_or_default();
        Ok(report)
    }
}

impl std::fmt::Debug for BatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchHandle")
            .field("status", &self.status())
            .finish()
    }
}

/// Batch lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchStatus {
    /// Tasks are queued or in flight.
    #[default]
    Running,

    /// The queue drained and every in-flight task finished.
    Completed,

    /// The scheduler shut down before the batch finished.
    Interrupted,
}

impl BatchStatus {
    /// Whether the batch has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Interrupted)
    }

    /// Whether every task ran to completion.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Completed => write!(f, "Completed"),
            Self::Interrupted => write!(f, "Interrupted"),
        }
    }
}

/// Final accounting for a batch.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchReport {
    /// Tasks submitted at batch start.
    pub submitted: usize,

    /// Tasks that completed normally.
    pub succeeded: usize,

    /// Tasks that reported an error, in completion order.
    pub failed: Vec<FailedTask>,

    /// Wall-clock time from batch start to the last completion.
    pub duration: Duration,
}

impl BatchReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every submitted task succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Success ratio over submitted tasks (0.0 - 1.0).
    pub fn success_ratio(&self) -> f64 {
        if self.submitted == 0 {
            1.0
        } else {
            self.succeeded as f64 / self.submitted as f64
        }
    }
}

/// A task that reported an error instead of completing normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTask {
    /// Which task failed.
    pub task_id: TaskId,
    /// The error it reported.
    pub error: TaskError,
}
