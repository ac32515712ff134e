//! Batch lifecycle.
//!
//! This module handles completion accounting and batch resolution:
//! - Folding task completions into the running totals
//! - Resolving the batch once all work is accounted for
//! - Early resolution when shutdown interrupts the batch

use super::core::Dispatcher;
use super::handle::{BatchReport, BatchStatus, FailedTask};
use super::task::{TaskCompletion, TaskOutcome};
use super::telemetry::TelemetryEvent;
use tracing::{debug, info, warn};

impl Dispatcher {
    /// Folds one finished task into the running totals.
    ///
    /// A failure never aborts the batch. It is recorded in the report and
    /// the freed slot goes to the next queued task like any other.
    pub(crate) fn handle_completion(&mut self, completion: TaskCompletion) {
        self.active_count = self.active_count.saturating_sub(1);

        match completion.outcome {
            TaskOutcome::Success => {
                self.succeeded += 1;

                debug!(
                    task_id = %completion.task_id,
                    duration_ms = completion.duration.as_millis(),
                    "Task completed"
                );

                self.telemetry.emit(TelemetryEvent::TaskCompleted {
                    task_id: completion.task_id,
                    duration: completion.duration,
                });
            }
            TaskOutcome::Failed(error) => {
                warn!(
                    task_id = %completion.task_id,
                    error = %error,
                    duration_ms = completion.duration.as_millis(),
                    "Task failed"
                );

                self.telemetry.emit(TelemetryEvent::TaskFailed {
                    task_id: completion.task_id.clone(),
                    error: error.clone(),
                    duration: completion.duration,
                });

                self.failed.push(FailedTask {
                    task_id: completion.task_id,
                    error,
                });
            }
        }
    }

    /// Resolves the batch as completed.
    ///
    /// Idempotent. The first call publishes the report and the terminal
    /// status; later calls return without effect.
    pub(crate) async fn finish_batch(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let report = self.build_report();

        info!(
            succeeded = report.succeeded,
            failed = report.failed.len(),
            duration_ms = report.duration.as_millis(),
            "Batch completed"
        );

        self.telemetry.emit(TelemetryEvent::BatchCompleted {
            succeeded: report.succeeded,
            failed: report.failed.len(),
            duration: report.duration,
        });

        self.publish(report, BatchStatus::Completed).await;
    }

    /// Resolves the batch as interrupted by shutdown.
    ///
    /// Queued tasks are dropped unadmitted. In-flight tasks keep running
    /// on the runtime but their completions are no longer collected.
    pub(crate) async fn interrupt(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        warn!(
            admitted = self.admitted,
            queued = self.queue.len(),
            in_flight = self.active_count,
            "Batch interrupted"
        );

        let report = self.build_report();
        self.publish(report, BatchStatus::Interrupted).await;
    }

    fn build_report(&self) -> BatchReport {
        BatchReport {
            submitted: self.total_tasks,
            succeeded: self.succeeded,
            failed: self.failed.clone(),
            duration: self.started_at.elapsed(),
        }
    }

    /// Fills the report holder, then flips the status watch.
    ///
    /// Order matters: [`BatchHandle::wait`](super::handle::BatchHandle::wait)
    /// reads the holder only after it observes a terminal status.
    async fn publish(&mut self, report: BatchReport, status: BatchStatus) {
        {
            let mut holder = self.report.lock().await;
            *holder = Some(report);
        }
        let _ = self.status_tx.send(status);
    }
}
