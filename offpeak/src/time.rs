//! Time-of-day helpers.
//!
//! This module provides the hour arithmetic used by the concurrency limit
//! policy: a half-open window of local hours and a sampler for the current
//! local hour.

use chrono::{Local, Timelike};

/// A half-open window of local hours, `[start, end)`.
///
/// Windows may wrap around midnight: `HourWindow::new(22, 6)` covers
/// 22:00 through 05:59. A window where `start == end` is empty.
///
/// # Example
///
/// ```
/// use offpeak::time::HourWindow;
///
/// let business_hours = HourWindow::new(9, 17);
/// assert!(business_hours.contains(9));
/// assert!(!business_hours.contains(17));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourWindow {
    start: u32,
    end: u32,
}

impl HourWindow {
    /// Create a window covering `[start, end)` in local hours.
    ///
    /// Hours are taken modulo 24, so out-of-range values fold into a day.
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: start % 24,
            end: end % 24,
        }
    }

    /// Whether the given hour (0-23) falls inside the window.
    pub fn contains(&self, hour: u32) -> bool {
        let hour = hour % 24;
        if self.start <= self.end {
            hour >= self.start && hour < self.end
        } else {
            // Wraps midnight
            hour >= self.start || hour < self.end
        }
    }

    /// Window start hour (inclusive).
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Window end hour (exclusive).
    pub fn end(&self) -> u32 {
        self.end
    }
}

impl std::fmt::Display for HourWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}

/// The current local hour, 0-23.
pub fn local_hour() -> u32 {
    Local::now().hour()
}
