//! Offpeak - bounded-concurrency batch scheduling
//!
//! This library runs batches of tasks under a concurrency ceiling that can
//! change while the batch is in flight, driven by a time-of-day policy or
//! any other [`LimitSource`](scheduler::LimitSource) implementation.
//!
//! # High-Level API
//!
//! For most use cases, the [`scheduler`] module's controller is the entry
//! point:
//!
//! ```ignore
//! use offpeak::scheduler::{BatchController, SchedulerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let controller = BatchController::new(SchedulerConfig::default());
//! let report = controller
//!     .run(controller.demo_batch(), CancellationToken::new())
//!     .await?;
//!
//! println!("{} of {} tasks succeeded", report.succeeded, report.submitted);
//! ```

pub mod config;
pub mod logging;
pub mod scheduler;
pub mod time;

/// Version of the offpeak library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_injected_from_the_workspace() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.chars().next().is_some_and(|c| c.is_ascii_digit()));
    }
}
