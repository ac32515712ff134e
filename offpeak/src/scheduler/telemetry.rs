//! Telemetry for batch scheduling observability.
//!
//! The scheduler emits structured events via a sink abstraction and doesn't
//! know how they are consumed. Consumers (logging, a UI, test recorders)
//! decide how to present or aggregate.

use super::task::{TaskError, TaskId};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Telemetry Events
// =============================================================================

/// Events emitted over the life of a batch.
///
/// Together these events are the scheduler's observable boundary: batch
/// start and end, every admission, every completion, and every limit change.
#[derive(Clone, Debug)]
pub enum TelemetryEvent {
    /// A batch began: the queue was seeded and the initial limit sampled.
    BatchStarted {
        task_count: usize,
        task_names: Vec<String>,
        initial_limit: usize,
    },

    /// A task left the queue and its execution was spawned.
    TaskAdmitted {
        task_id: TaskId,
        /// 1-based admission position within the batch.
        position: usize,
        /// Total tasks in the batch.
        total: usize,
        /// In-flight executions immediately after this admission.
        active: usize,
        /// Concurrency limit at the moment of admission.
        limit: usize,
    },

    /// A task execution finished normally.
    TaskCompleted { task_id: TaskId, duration: Duration },

    /// A task execution reported an error.
    TaskFailed {
        task_id: TaskId,
        error: TaskError,
        duration: Duration,
    },

    /// The monitor published a new concurrency limit.
    LimitChanged { previous: usize, current: usize },

    /// The queue drained and the last in-flight task finished.
    BatchCompleted {
        succeeded: usize,
        failed: usize,
        duration: Duration,
    },
}

impl TelemetryEvent {
    /// Returns the task ID associated with this event, if any.
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::TaskAdmitted { task_id, .. }
            | Self::TaskCompleted { task_id, .. }
            | Self::TaskFailed { task_id, .. } => Some(task_id),
            Self::BatchStarted { .. } | Self::LimitChanged { .. } | Self::BatchCompleted { .. } => {
                None
            }
        }
    }

    /// Returns a short name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::BatchStarted { .. } => "batch_started",
            Self::TaskAdmitted { .. } => "task_admitted",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TaskFailed { .. } => "task_failed",
            Self::LimitChanged { .. } => "limit_changed",
            Self::BatchCompleted { .. } => "batch_completed",
        }
    }
}

// =============================================================================
// Telemetry Sink Trait
// =============================================================================

/// Sink for telemetry events.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; events are emitted from the
/// dispatch loop and from the monitor task.
pub trait TelemetrySink: Send + Sync {
    /// Called when a telemetry event occurs.
    ///
    /// Should be fast and non-blocking; the dispatch loop emits inline.
    fn emit(&self, event: TelemetryEvent);
}

// =============================================================================
// Built-in Sink Implementations
// =============================================================================

/// No-op sink for when telemetry is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn emit(&self, _event: TelemetryEvent) {
        // Intentionally empty
    }
}

/// Sink that logs events using the `tracing` crate.
///
/// Per-task lines log at info so a batch run reads as a narrative; task
/// failures log at warn.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        match &event {
            TelemetryEvent::BatchStarted {
                task_count,
                task_names,
                initial_limit,
            } => {
                tracing::info!(
                    task_count = task_count,
                    tasks = ?task_names,
                    limit = initial_limit,
                    "Batch started"
                );
            }
            TelemetryEvent::TaskAdmitted {
                task_id,
                position,
                total,
                active,
                limit,
            } => {
                tracing::info!(
                    task = %task_id,
                    position = format_args!("{}/{}", position, total),
                    concurrency = format_args!("{}/{}", active, limit),
                    "Task admitted"
                );
            }
            TelemetryEvent::TaskCompleted { task_id, duration } => {
                tracing::info!(
                    task = %task_id,
                    duration_ms = duration.as_millis(),
                    "Task finished"
                );
            }
            TelemetryEvent::TaskFailed {
                task_id,
                error,
                duration,
            } => {
                tracing::warn!(
                    task = %task_id,
                    error = %error,
                    duration_ms = duration.as_millis(),
                    "Task failed"
                );
            }
            TelemetryEvent::LimitChanged { previous, current } => {
                tracing::info!(
                    previous = previous,
                    current = current,
                    "Concurrency limit changed"
                );
            }
            TelemetryEvent::BatchCompleted {
                succeeded,
                failed,
                duration,
            } => {
                tracing::info!(
                    succeeded = succeeded,
                    failed = failed,
                    duration_ms = duration.as_millis(),
                    "Batch completed"
                );
            }
        }
    }
}

/// Sink that forwards events to multiple sinks.
pub struct MultiplexTelemetrySink {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl MultiplexTelemetrySink {
    /// Creates a multiplex sink over the given sinks.
    pub fn new(sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self { sinks }
    }

    /// Adds a sink to the multiplex.
    pub fn add_sink(&mut self, sink: Arc<dyn TelemetrySink>) {
        self.sinks.push(sink);
    }
}

impl TelemetrySink for MultiplexTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}

impl std::fmt::Debug for MultiplexTelemetrySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplexTelemetrySink")
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn null_sink_swallows_events() {
        let sink = NullTelemetrySink;
        sink.emit(TelemetryEvent::LimitChanged {
            previous: 4,
            current: 20,
        });
    }

    #[test]
    fn tracing_sink_accepts_all_events() {
        let sink = TracingTelemetrySink;
        // Logging may or may not be configured; emitting must not panic
        sink.emit(TelemetryEvent::BatchStarted {
            task_count: 2,
            task_names: vec!["a".to_string(), "b".to_string()],
            initial_limit: 4,
        });
        sink.emit(TelemetryEvent::TaskFailed {
            task_id: TaskId::new("a"),
            error: TaskError::Failed("boom".to_string()),
            duration: Duration::from_millis(12),
        });
    }

    #[test]
    fn event_task_id() {
        let task_id = TaskId::new("indexing");

        let event = TelemetryEvent::TaskCompleted {
            task_id: task_id.clone(),
            duration: Duration::ZERO,
        };
        assert_eq!(event.task_id(), Some(&task_id));

        let event = TelemetryEvent::LimitChanged {
            previous: 2,
            current: 5,
        };
        assert_eq!(event.task_id(), None);
    }

    #[test]
    fn event_type_names() {
        assert_eq!(
            TelemetryEvent::BatchStarted {
                task_count: 0,
                task_names: vec![],
                initial_limit: 1,
            }
            .event_type(),
            "batch_started"
        );
        assert_eq!(
            TelemetryEvent::TaskAdmitted {
                task_id: TaskId::new("x"),
                position: 1,
                total: 1,
                active: 1,
                limit: 4,
            }
            .event_type(),
            "task_admitted"
        );
        assert_eq!(
            TelemetryEvent::BatchCompleted {
                succeeded: 1,
                failed: 0,
                duration: Duration::ZERO,
            }
            .event_type(),
            "batch_completed"
        );
    }

    #[test]
    fn multiplex_fans_out() {
        struct CountingSink(AtomicUsize);

        impl TelemetrySink for CountingSink {
            fn emit(&self, _event: TelemetryEvent) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let sink1 = Arc::new(CountingSink(AtomicUsize::new(0)));
        let sink2 = Arc::new(CountingSink(AtomicUsize::new(0)));

        let multiplex = MultiplexTelemetrySink::new(vec![
            Arc::clone(&sink1) as Arc<dyn TelemetrySink>,
            Arc::clone(&sink2) as Arc<dyn TelemetrySink>,
        ]);

        multiplex.emit(TelemetryEvent::LimitChanged {
            previous: 4,
            current: 20,
        });

        assert_eq!(sink1.0.load(Ordering::Relaxed), 1);
        assert_eq!(sink2.0.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn multiplex_debug_reports_sink_count() {
        let multiplex = MultiplexTelemetrySink::new(vec![Arc::new(NullTelemetrySink)]);
        assert!(format!("{:?}", multiplex).contains("sink_count: 1"));
    }
}
