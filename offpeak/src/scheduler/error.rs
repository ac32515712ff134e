//! Batch-level error types.

use super::limit::LimitSourceError;

/// Errors returned by the batch controller.
///
/// Task failures are not here: they are data in the
/// [`BatchReport`](super::BatchReport), because a failing task never fails
/// the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// Sampling the initial concurrency limit failed. There is no previous
    /// value to keep at startup, so the run cannot begin.
    #[error("failed to sample the initial concurrency limit: {0}")]
    InitialLimit(#[from] LimitSourceError),

    /// The scheduler was shut down before the batch completed.
    #[error("batch interrupted before completion")]
    Interrupted,
}
