//! Concurrency limit sources.
//!
//! A [`LimitSource`] answers one question: how many tasks may run at once,
//! right now? The answer may change between calls. Sources are polled by
//! the [`LimitMonitor`](super::LimitMonitor), never by the dispatch loop
//! itself.

use crate::time::{HourWindow, local_hour};

/// Error from sampling a limit source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LimitSourceError {
    /// The source could not produce a value.
    #[error("limit source unavailable: {0}")]
    Unavailable(String),
}

/// Supplies the current concurrency ceiling on demand.
///
/// Implementations must be side-effect free and callable any number of
/// times. The returned value is the desired ceiling at this instant; the
/// scheduler tolerates staleness of up to one monitor polling interval.
pub trait LimitSource: Send + Sync {
    /// The ceiling the scheduler should enforce right now.
    fn current_limit(&self) -> Result<usize, LimitSourceError>;
}

/// Time-of-day limit policy.
///
/// Returns the lower `peak_limit` while the local hour is inside the peak
/// window and `offpeak_limit` otherwise, so heavy batches yield to other
/// load during the hours that matter.
///
/// # Example
///
/// ```
/// use offpeak::scheduler::TimeOfDaySource;
/// use offpeak::time::HourWindow;
///
/// let source = TimeOfDaySource::new(HourWindow::new(9, 17), 4, 20);
/// assert_eq!(source.limit_for_hour(10), 4);
/// assert_eq!(source.limit_for_hour(20), 20);
/// ```
#[derive(Debug, Clone)]
pub struct TimeOfDaySource {
    peak_window: HourWindow,
    peak_limit: usize,
    offpeak_limit: usize,
}

impl TimeOfDaySource {
    /// Creates a time-of-day source.
    ///
    /// Limits are clamped to at least 1; a ceiling of zero would block
    /// admission forever.
    pub fn new(peak_window: HourWindow, peak_limit: usize, offpeak_limit: usize) -> Self {
        Self {
            peak_window,
            peak_limit: peak_limit.max(1),
            offpeak_limit: offpeak_limit.max(1),
        }
    }

    /// The limit this policy yields for a given local hour.
    ///
    /// Pure mapping, usable without a clock.
    pub fn limit_for_hour(&self, hour: u32) -> usize {
        if self.peak_window.contains(hour) {
            self.peak_limit
        } else {
            self.offpeak_limit
        }
    }

    /// The peak window this policy throttles in.
    pub fn peak_window(&self) -> HourWindow {
        self.peak_window
    }
}

impl LimitSource for TimeOfDaySource {
    fn current_limit(&self) -> Result<usize, LimitSourceError> {
        Ok(self.limit_for_hour(local_hour()))
    }
}

/// A source that always returns the same ceiling.
///
/// Used for fixed-limit runs and as a deterministic stand-in during tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedLimitSource(usize);

impl FixedLimitSource {
    /// Creates a fixed source; the value is clamped to at least 1.
    pub fn new(limit: usize) -> Self {
        Self(limit.max(1))
    }
}

impl LimitSource for FixedLimitSource {
    fn current_limit(&self) -> Result<usize, LimitSourceError> {
        Ok(self.0)
    }
}
