//! Dispatch loop core - main struct and run loop.
//!
//! This module contains the [`Dispatcher`] struct and its event loop.
//! Handler methods are implemented in separate modules:
//! - `dispatch`: Task admission
//! - `lifecycle`: Completion accounting and batch resolution

use super::handle::{BatchHandle, BatchReport, BatchStatus, FailedTask};
use super::task::{Task, TaskCompletion, TaskExecutor};
use super::telemetry::{NullTelemetrySink, TelemetrySink};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

// =============================================================================
// Dispatcher
// =============================================================================

/// The dispatch loop for a single batch.
///
/// The dispatcher owns every piece of batch state: the pending queue, the
/// active count and the result totals. Spawned tasks never touch that state
/// directly; they report back over the completion channel and the loop does
/// the accounting, so admission decisions always see consistent counts.
///
/// The concurrency limit arrives over a watch channel. Whoever holds the
/// sender (normally a [`LimitMonitor`](super::monitor::LimitMonitor)) can
/// re-publish at any time and the loop reacts on the next iteration.
pub(crate) struct Dispatcher {
    /// Tasks not yet admitted, in submission order.
    pub(crate) queue: VecDeque<Task>,

    /// Number of tasks currently in flight.
    pub(crate) active_count: usize,

    /// Live concurrency ceiling.
    pub(crate) limit_rx: watch::Receiver<usize>,

    /// Sender cloned into every spawned task.
    pub(crate) completion_tx: mpsc::UnboundedSender<TaskCompletion>,

    /// Receives one message per finished task.
    pub(crate) completion_rx: mpsc::UnboundedReceiver<TaskCompletion>,

    /// Runs the work of each admitted task.
    pub(crate) executor: Arc<dyn TaskExecutor>,

    /// Telemetry sink for emitting events.
    pub(crate) telemetry: Arc<dyn TelemetrySink>,

    /// Publishes batch status changes to the handle.
    pub(crate) status_tx: watch::Sender<BatchStatus>,

    /// Report slot shared with the handle, filled on resolution.
    pub(crate) report: Arc<Mutex<Option<BatchReport>>>,

    /// Size of the batch as submitted.
    pub(crate) total_tasks: usize,

    /// Number of tasks admitted so far.
    pub(crate) admitted: usize,

    /// Number of tasks that completed successfully.
    pub(crate) succeeded: usize,

    /// Tasks that completed with a failure.
    pub(crate) failed: Vec<FailedTask>,

    /// When the dispatcher was created.
    pub(crate) started_at: Instant,

    /// Set once the batch has resolved; resolution is idempotent.
    pub(crate) finished: bool,

    /// Set when the limit sender is gone, disabling that select arm.
    pub(crate) limit_closed: bool,
}

impl Dispatcher {
    /// Creates a dispatcher for one batch, along with the handle used to
    /// await it.
    ///
    /// `limit_rx` must already hold the initial concurrency limit; the
    /// dispatcher never samples the limit source itself.
    pub(crate) fn new(
        tasks: Vec<Task>,
        limit_rx: watch::Receiver<usize>,
        executor: Arc<dyn TaskExecutor>,
    ) -> (Self, BatchHandle) {
        Self::with_telemetry(tasks, limit_rx, executor, Arc::new(NullTelemetrySink))
    }

    /// Creates a dispatcher that reports progress to a telemetry sink.
    pub(crate) fn with_telemetry(
        tasks: Vec<Task>,
        limit_rx: watch::Receiver<usize>,
        executor: Arc<dyn TaskExecutor>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> (Self, BatchHandle) {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(BatchStatus::Running);

        let handle = BatchHandle::new(status_rx);
        let total_tasks = tasks.len();

        let dispatcher = Self {
            queue: VecDeque::from(tasks),
            active_count: 0,
            limit_rx,
            completion_tx,
            completion_rx,
            executor,
            telemetry,
            status_tx,
            report: handle.report_holder(),
            total_tasks,
            admitted: 0,
            succeeded: 0,
            failed: Vec::new(),
            started_at: Instant::now(),
            finished: false,
            limit_closed: false,
        };

        (dispatcher, handle)
    }

    /// Runs the dispatch loop until the batch resolves or `shutdown` fires.
    pub(crate) async fn run(mut self, shutdown: CancellationToken) {
        info!(
            task_count = self.total_tasks,
            initial_limit = *self.limit_rx.borrow(),
            "Dispatch loop started"
        );

        // First wave. An empty batch resolves right here.
        self.reconcile().await;

        while !self.finished {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    self.interrupt().await;
                    break;
                }

                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion);
                    self.reconcile().await;
                }

                // A publish may raise the ceiling, so admission re-runs
                // without waiting for a completion.
                changed = self.limit_rx.changed(), if !self.limit_closed => {
                    match changed {
                        Ok(()) => self.reconcile().await,
                        // Sender gone. The last published limit stays in
                        // force and this arm stops polling.
                        Err(_) => self.limit_closed = true,
                    }
                }
            }
        }

        debug!(
            succeeded = self.succeeded,
            failed = self.failed.len(),
            "Dispatch loop exited"
        );
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("queued", &self.queue.len())
            .field("active_count", &self.active_count)
            .field("admitted", &self.admitted)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::error::SchedulerError;
    use crate::scheduler::task::{SleepExecutor, TaskError, TaskId, TaskOutcome};
    use std::time::Duration;
    use tokio::time::timeout;

    const GUARD: Duration = Duration::from_secs(5);

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn batch(count: usize) -> Vec<Task> {
        (0..count).map(|i| Task::named(format!("t{i}"))).collect()
    }

    fn completed(id: &str) -> TaskCompletion {
        TaskCompletion {
            task_id: TaskId::new(id),
            outcome: TaskOutcome::Success,
            duration: Duration::from_millis(1),
        }
    }

    fn dispatcher(
        count: usize,
        limit: usize,
    ) -> (Dispatcher, BatchHandle, watch::Sender<usize>) {
        let (limit_tx, limit_rx) = watch::channel(limit);
        let executor: Arc<dyn TaskExecutor> =
            Arc::new(SleepExecutor::new(Duration::from_millis(5)));
        let (dispatcher, handle) = Dispatcher::new(batch(count), limit_rx, executor);
        (dispatcher, handle, limit_tx)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn dispatcher_starts_idle() {
        let (dispatcher, handle, _limit_tx) = dispatcher(10, 4);

        assert_eq!(dispatcher.queue.len(), 10);
        assert_eq!(dispatcher.active_count, 0);
        assert_eq!(dispatcher.admitted, 0);
        assert!(!dispatcher.finished);
        assert_eq!(handle.status(), BatchStatus::Running);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admission
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn reconcile_admits_up_to_the_limit() {
        let (mut dispatcher, _handle, _limit_tx) = dispatcher(10, 4);

        dispatcher.reconcile().await;

        assert_eq!(dispatcher.active_count, 4);
        assert_eq!(dispatcher.admitted, 4);
        assert_eq!(dispatcher.queue.len(), 6);
    }

    #[tokio::test]
    async fn reconcile_is_idempotent_while_saturated() {
        let (mut dispatcher, _handle, _limit_tx) = dispatcher(10, 4);

        dispatcher.reconcile().await;
        dispatcher.reconcile().await;

        assert_eq!(dispatcher.active_count, 4);
        assert_eq!(dispatcher.admitted, 4);
    }

    #[tokio::test]
    async fn short_queue_admits_everything() {
        let (mut dispatcher, _handle, _limit_tx) = dispatcher(3, 8);

        dispatcher.reconcile().await;

        assert_eq!(dispatcher.active_count, 3);
        assert!(dispatcher.queue.is_empty());
        assert!(!dispatcher.finished);
    }

    #[tokio::test]
    async fn completion_frees_a_slot() {
        let (mut dispatcher, _handle, _limit_tx) = dispatcher(10, 4);
        dispatcher.reconcile().await;

        dispatcher.handle_completion(completed("t0"));
        assert_eq!(dispatcher.active_count, 3);

        dispatcher.reconcile().await;
        assert_eq!(dispatcher.active_count, 4);
        assert_eq!(dispatcher.admitted, 5);
    }

    #[tokio::test]
    async fn limit_raise_admits_without_a_completion() {
        let (mut dispatcher, _handle, limit_tx) = dispatcher(10, 2);
        dispatcher.reconcile().await;
        assert_eq!(dispatcher.admitted, 2);

        limit_tx.send(5).expect("receiver alive");
        dispatcher.reconcile().await;

        assert_eq!(dispatcher.active_count, 5);
        assert_eq!(dispatcher.admitted, 5);
    }

    #[tokio::test]
    async fn limit_drop_leaves_in_flight_tasks_alone() {
        let (mut dispatcher, _handle, limit_tx) = dispatcher(10, 4);
        dispatcher.reconcile().await;

        limit_tx.send(1).expect("receiver alive");
        dispatcher.reconcile().await;
        assert_eq!(dispatcher.active_count, 4);

        dispatcher.handle_completion(completed("t0"));
        dispatcher.reconcile().await;

        // Still over the new ceiling, so nothing new goes out.
        assert_eq!(dispatcher.active_count, 3);
        assert_eq!(dispatcher.admitted, 4);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn empty_batch_resolves_on_first_reconcile() {
        let (mut dispatcher, mut handle, _limit_tx) = dispatcher(0, 4);

        dispatcher.reconcile().await;

        assert!(dispatcher.finished);
        assert_eq!(handle.status(), BatchStatus::Completed);

        let report = timeout(GUARD, handle.wait())
            .await
            .expect("wait timed out")
            .expect("batch should complete");
        assert_eq!(report.submitted, 0);
        assert_eq!(report.succeeded, 0);
    }

    #[tokio::test]
    async fn resolving_twice_is_a_no_op() {
        let (mut dispatcher, handle, _limit_tx) = dispatcher(0, 4);

        dispatcher.reconcile().await;
        dispatcher.reconcile().await;

        assert_eq!(handle.status(), BatchStatus::Completed);
    }

    #[tokio::test]
    async fn failed_completion_lands_in_the_report() {
        let (mut dispatcher, mut handle, _limit_tx) = dispatcher(1, 4);
        dispatcher.reconcile().await;

        dispatcher.handle_completion(TaskCompletion {
            task_id: TaskId::new("t0"),
            outcome: TaskOutcome::Failed(TaskError::Failed("boom".to_string())),
            duration: Duration::from_millis(3),
        });
        dispatcher.reconcile().await;

        assert!(dispatcher.finished);
        let report = timeout(GUARD, handle.wait())
            .await
            .expect("wait timed out")
            .expect("batch should complete");
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].task_id, TaskId::new("t0"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Run loop
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn run_drives_a_batch_to_completion() {
        let (_limit_tx, limit_rx) = watch::channel(3);
        let executor: Arc<dyn TaskExecutor> =
            Arc::new(SleepExecutor::new(Duration::from_millis(10)));
        let (dispatcher, mut handle) = Dispatcher::new(batch(8), limit_rx, executor);

        tokio::spawn(dispatcher.run(CancellationToken::new()));

        let report = timeout(GUARD, handle.wait())
            .await
            .expect("wait timed out")
            .expect("batch should complete");

        assert_eq!(report.submitted, 8);
        assert_eq!(report.succeeded, 8);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn shutdown_interrupts_the_run_loop() {
        let (_limit_tx, limit_rx) = watch::channel(1);
        let executor: Arc<dyn TaskExecutor> =
            Arc::new(SleepExecutor::new(Duration::from_secs(30)));
        let (dispatcher, mut handle) = Dispatcher::new(batch(4), limit_rx, executor);

        let shutdown = CancellationToken::new();
        tokio::spawn(dispatcher.run(shutdown.clone()));
        shutdown.cancel();

        let result = timeout(GUARD, handle.wait()).await.expect("wait timed out");
        assert_eq!(result, Err(SchedulerError::Interrupted));
    }
}
