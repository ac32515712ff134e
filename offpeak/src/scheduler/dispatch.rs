//! Task admission.
//!
//! This module implements the admission half of the dispatch loop: queued
//! tasks are released for execution whenever the active count sits below
//! the concurrency limit currently in force.

use super::core::Dispatcher;
use super::task::{Task, TaskCompletion};
use super::telemetry::TelemetryEvent;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

impl Dispatcher {
    /// Brings the batch state in line with the queue and the current limit.
    ///
    /// Called after every event the run loop observes. Resolves the batch
    /// once nothing is queued or in flight; otherwise admits queued tasks
    /// until the active count reaches the limit. Calling it when nothing
    /// changed is harmless.
    pub(crate) async fn reconcile(&mut self) {
        if self.queue.is_empty() && self.active_count == 0 {
            self.finish_batch().await;
            return;
        }

        let limit = *self.limit_rx.borrow_and_update();
        while self.active_count < limit {
            let Some(task) = self.queue.pop_front() else {
                break;
            };
            self.admit(task, limit);
        }
    }

    /// Admits a single task: accounting, telemetry, then the spawn.
    fn admit(&mut self, task: Task, limit: usize) {
        self.active_count += 1;
        self.admitted += 1;

        debug!(
            task_id = %task.id(),
            position = self.admitted,
            total = self.total_tasks,
            active = self.active_count,
            limit,
            "Task admitted"
        );

        self.telemetry.emit(TelemetryEvent::TaskAdmitted {
            task_id: task.id().clone(),
            position: self.admitted,
            total: self.total_tasks,
            active: self.active_count,
            limit,
        });

        let executor = Arc::clone(&self.executor);
        let completion_tx = self.completion_tx.clone();
        let task_id = task.id().clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = executor.execute(&task).await;

            // The loop may already be gone on shutdown; nothing to do then.
            let _ = completion_tx.send(TaskCompletion {
                task_id,
                outcome,
                duration: started.elapsed(),
            });
        });
    }
}
