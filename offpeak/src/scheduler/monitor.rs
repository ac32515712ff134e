//! Concurrency limit monitor daemon.
//!
//! This module provides the background daemon that periodically samples a
//! [`LimitSource`] and publishes ceiling changes to the dispatch loop over
//! a watch channel.
//!
//! # Architecture
//!
//! The monitor runs in a background task and:
//! 1. Samples the limit source on a fixed period (default: every 5 seconds)
//! 2. Publishes the value on the watch channel only when it changed
//! 3. Keeps the previous limit and warns when a sample fails
//! 4. Respects cancellation; the batch controller cancels it as soon as the
//!    batch completes
//!
//! # Example
//!
//! ```ignore
//! use offpeak::scheduler::LimitMonitor;
//!
//! let monitor = LimitMonitor::new(source, limit_tx, telemetry)
//!     .with_poll_interval(Duration::from_secs(5));
//!
//! tokio::spawn(monitor.run(shutdown_token));
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::DEFAULT_POLL_INTERVAL_SECS;
use super::limit::LimitSource;
use super::telemetry::{TelemetryEvent, TelemetrySink};

/// Background daemon that keeps the published concurrency limit current.
///
/// The monitor is the only writer of the limit channel. It runs on its own
/// timer, decoupled from dispatch activity, so a ceiling change lands even
/// while every admission is blocked or the queue is idle.
pub struct LimitMonitor {
    /// Where the ceiling comes from.
    source: Arc<dyn LimitSource>,

    /// Publishes ceiling changes to the dispatch loop.
    limit_tx: watch::Sender<usize>,

    /// Sink for limit-change events.
    telemetry: Arc<dyn TelemetrySink>,

    /// Interval between samples.
    poll_interval: Duration,
}

impl LimitMonitor {
    /// Creates a monitor with the default polling interval.
    ///
    /// The watch channel must already hold the initial limit; the monitor
    /// only publishes changes relative to it.
    pub fn new(
        source: Arc<dyn LimitSource>,
        limit_tx: watch::Sender<usize>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            source,
            limit_tx,
            telemetry,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }

    /// Sets a custom polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The most recently published limit.
    pub fn published_limit(&self) -> usize {
        *self.limit_tx.borrow()
    }

    /// Samples the source once and publishes the value if it changed.
    ///
    /// A failed sample keeps the previous limit. A sampled value of zero is
    /// treated the same way; the source contract is a positive ceiling and
    /// publishing zero would block admission forever.
    pub fn sample_once(&self) {
        let sampled = match self.source.current_limit() {
            Ok(limit) => limit,
            Err(err) => {
                warn!(error = %err, "Limit sample failed, keeping previous limit");
                return;
            }
        };

        if sampled == 0 {
            warn!("Limit source returned zero, keeping previous limit");
            return;
        }

        let previous = self.published_limit();
        if sampled == previous {
            debug!(limit = sampled, "Limit unchanged");
            return;
        }

        self.telemetry.emit(TelemetryEvent::LimitChanged {
            previous,
            current: sampled,
        });
        // Receiver dropping means the dispatch loop is gone; nothing to do
        let _ = self.limit_tx.send(sampled);
    }

    /// Runs the monitor until shutdown is signalled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis(),
            initial_limit = self.published_limit(),
            "Limit monitor starting"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        // The initial limit was sampled at batch start; skip the immediate
        // first tick so it is not republished
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Limit monitor shutting down");
                    break;
                }

                _ = interval.tick() => {
                    self.sample_once();
                }
            }
        }
    }
}
