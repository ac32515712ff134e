//! Task types and the executor seam.
//!
//! A task is an opaque descriptor of one unit of independent work. The
//! scheduler never looks inside a task; it hands the descriptor to a
//! [`TaskExecutor`] and waits for the outcome.

use rand::Rng;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Global counter for generating unique task IDs.
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Shortest name produced by [`TaskId::random`].
const RANDOM_NAME_MIN_LEN: usize = 3;
/// Longest name produced by [`TaskId::random`].
const RANDOM_NAME_MAX_LEN: usize = 12;

/// Unique identifier for a task.
///
/// Task IDs are strings. They can be generated automatically, drawn at
/// random (the demo batch style), or constructed from meaningful data.
///
/// # Example
///
/// ```
/// use offpeak::scheduler::TaskId;
///
/// // Auto-generated unique ID
/// let id = TaskId::auto();
/// assert!(id.as_str().starts_with("task-"));
///
/// // ID from meaningful data
/// let id = TaskId::new("reindex-users");
/// ```
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a task ID with the given string value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a unique auto-generated task ID.
    ///
    /// The format is `task-{counter}` where the counter is monotonically
    /// increasing for the lifetime of the process.
    pub fn auto() -> Self {
        let counter = TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("task-{}", counter))
    }

    /// Creates a random lowercase name of 3 to 12 characters.
    pub fn random() -> Self {
        let mut rng = rand::rng();
        let len = rng.random_range(RANDOM_NAME_MIN_LEN..=RANDOM_NAME_MAX_LEN);
        let name: String = (0..len).map(|_| rng.random_range('a'..='z')).collect();
        Self(name)
    }

    /// Returns the string value of this task ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One unit of independent work.
///
/// Immutable once created. A task lives in the queue until it is admitted,
/// then belongs to its in-flight execution until the completion message
/// arrives; after that it is discarded.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
}

impl Task {
    /// Creates a task with the given ID.
    pub fn new(id: TaskId) -> Self {
        Self { id }
    }

    /// Creates a task from a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(name),
        }
    }

    /// The task's identifier.
    pub fn id(&self) -> &TaskId {
        &self.id
    }
}

/// What a task execution reported back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task completed normally.
    Success,
    /// The task reported an error instead of completing.
    Failed(TaskError),
}

impl TaskOutcome {
    /// Short category string for logging and telemetry.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskOutcome::Success => "success",
            TaskOutcome::Failed(_) => "failed",
        }
    }

    /// Whether this outcome is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Error reported by a task execution.
///
/// Task errors are data, not control flow: the scheduler records them in
/// the batch report and keeps admitting work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The task raised an error instead of completing normally.
    #[error("task failed: {0}")]
    Failed(String),
}

/// Runs a single task to completion.
///
/// The returned future is awaited on a spawned runtime task, so it never
/// blocks the dispatch loop. Elapsed time is measured by the dispatcher
/// around the whole execution.
///
/// Liveness: the future must eventually resolve for every task it is given.
/// A task whose execution never completes holds its concurrency slot forever
/// and stalls batch completion; guarding against that (timeouts, watchdogs)
/// is the executor's responsibility, not the scheduler's.
pub trait TaskExecutor: Send + Sync + 'static {
    /// Executes the task and reports its outcome.
    fn execute<'a>(
        &'a self,
        task: &'a Task,
    ) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'a>>;
}

/// Reference executor: sleeps for a uniformly random duration in
/// `[0, max_delay)`, then succeeds.
///
/// Stands in for real work of unknown, variable duration. Tests substitute
/// deterministic executors through the same trait.
pub struct SleepExecutor {
    max_delay: Duration,
}

impl SleepExecutor {
    /// Creates a sleep executor with the given exclusive upper bound.
    pub fn new(max_delay: Duration) -> Self {
        Self { max_delay }
    }

    fn random_delay(&self) -> Duration {
        let max_ms = self.max_delay.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}

impl TaskExecutor for SleepExecutor {
    fn execute<'a>(
        &'a self,
        _task: &'a Task,
    ) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'a>> {
        // Draw the delay before the await point; the thread-local RNG is
        // not Send
        let delay = self.random_delay();
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            TaskOutcome::Success
        })
    }
}

/// Completion message sent from a finished execution back to the dispatch
/// loop.
#[derive(Debug)]
pub(crate) struct TaskCompletion {
    /// Which task finished.
    pub task_id: TaskId,
    /// How the execution ended.
    pub outcome: TaskOutcome,
    /// Wall-clock time from admission to completion.
    pub duration: Duration,
}
