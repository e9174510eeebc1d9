//! Queue metrics for observability
//!
//! Provides counters and statistics for monitoring queue health, including
//! submission volume, per-item fault counts, and the in-flight gauge.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for work queue observability
///
/// Tracks statistics about queue operation, particularly useful for spotting
/// fault-heavy workloads and submissions rejected during shutdown.
///
/// # Example
///
/// ```
/// use rust_workqueue_system::QueueMetrics;
///
/// let metrics = QueueMetrics::new();
///
/// metrics.record_submitted();
/// metrics.record_completed();
///
/// assert_eq!(metrics.submitted(), 1);
/// assert_eq!(metrics.completed(), 1);
/// ```
#[derive(Debug)]
pub struct QueueMetrics {
    /// Items accepted into the pending buffer
    submitted: AtomicU64,

    /// Items that executed and returned a value
    completed: AtomicU64,

    /// Items that executed and returned an error
    failed: AtomicU64,

    /// Items whose job panicked
    panicked: AtomicU64,

    /// Items abandoned as cancelled before execution
    cancelled: AtomicU64,

    /// Submissions rejected because shutdown had begun
    rejected: AtomicU64,

    /// Blocking submissions that gave up on their deadline
    submit_timeouts: AtomicU64,

    /// Items currently being executed by workers
    in_flight: AtomicU64,
}

impl QueueMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            submit_timeouts: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn panicked(&self) -> u64 {
        self.panicked.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn submit_timeouts(&self) -> u64 {
        self.submit_timeouts.load(Ordering::Relaxed)
    }

    /// Number of items currently executing on workers
    #[inline]
    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Record an accepted submission
    #[inline]
    pub fn record_submitted(&self) -> u64 {
        self.submitted.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a successful execution
    #[inline]
    pub fn record_completed(&self) -> u64 {
        self.completed.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a job that returned an error
    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a job that panicked
    #[inline]
    pub fn record_panicked(&self) -> u64 {
        self.panicked.fetch_add(1, Ordering::Relaxed)
    }

    /// Record an item abandoned as cancelled
    #[inline]
    pub fn record_cancelled(&self) -> u64 {
        self.cancelled.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a submission rejected during shutdown
    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a blocking submission that timed out
    #[inline]
    pub fn record_submit_timeout(&self) -> u64 {
        self.submit_timeouts.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn enter_flight(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn exit_flight(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    /// Items with a delivered outcome of any kind
    pub fn resolved(&self) -> u64 {
        self.completed() + self.failed() + self.panicked() + self.cancelled()
    }

    /// Fault rate as a percentage of resolved items (0.0 - 100.0)
    ///
    /// Returns 0.0 if no items have resolved.
    pub fn fault_rate(&self) -> f64 {
        let faults = (self.failed() + self.panicked() + self.cancelled()) as f64;
        let resolved = self.resolved() as f64;
        if resolved == 0.0 {
            0.0
        } else {
            (faults / resolved) * 100.0
        }
    }

    /// Reset all counters to zero
    ///
    /// Useful for testing or periodic reset of metrics.
    pub fn reset(&self) {
        self.submitted.store(0, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.panicked.store(0, Ordering::Relaxed);
        self.cancelled.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
        self.submit_timeouts.store(0, Ordering::Relaxed);
        self.in_flight.store(0, Ordering::Relaxed);
    }
}

impl Default for QueueMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for QueueMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            submitted: AtomicU64::new(self.submitted()),
            completed: AtomicU64::new(self.completed()),
            failed: AtomicU64::new(self.failed()),
            panicked: AtomicU64::new(self.panicked()),
            cancelled: AtomicU64::new(self.cancelled()),
            rejected: AtomicU64::new(self.rejected()),
            submit_timeouts: AtomicU64::new(self.submit_timeouts()),
            in_flight: AtomicU64::new(self.in_flight()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = QueueMetrics::new();
        assert_eq!(metrics.submitted(), 0);
        assert_eq!(metrics.completed(), 0);
        assert_eq!(metrics.failed(), 0);
        assert_eq!(metrics.panicked(), 0);
        assert_eq!(metrics.cancelled(), 0);
        assert_eq!(metrics.rejected(), 0);
        assert_eq!(metrics.in_flight(), 0);
    }

    #[test]
    fn test_metrics_record_counts() {
        let metrics = QueueMetrics::new();
        assert_eq!(metrics.record_submitted(), 0); // Returns previous value
        metrics.record_submitted();
        assert_eq!(metrics.submitted(), 2);

        metrics.record_completed();
        metrics.record_failed();
        metrics.record_cancelled();
        assert_eq!(metrics.resolved(), 3);
    }

    #[test]
    fn test_metrics_in_flight_gauge() {
        let metrics = QueueMetrics::new();
        metrics.enter_flight();
        metrics.enter_flight();
        assert_eq!(metrics.in_flight(), 2);
        metrics.exit_flight();
        assert_eq!(metrics.in_flight(), 1);
    }

    #[test]
    fn test_metrics_fault_rate() {
        let metrics = QueueMetrics::new();

        // Nothing resolved - 0% fault rate
        assert_eq!(metrics.fault_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_completed();
        }
        for _ in 0..10 {
            metrics.record_failed();
        }

        // 10 out of 100 = 10%
        let rate = metrics.fault_rate();
        assert!((9.9..=10.1).contains(&rate), "Fault rate was {}", rate);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = QueueMetrics::new();
        metrics.record_submitted();
        metrics.record_completed();
        metrics.record_rejected();

        metrics.reset();

        assert_eq!(metrics.submitted(), 0);
        assert_eq!(metrics.completed(), 0);
        assert_eq!(metrics.rejected(), 0);
    }

    #[test]
    fn test_metrics_clone() {
        let metrics = QueueMetrics::new();
        metrics.record_submitted();
        metrics.record_completed();

        let snapshot = metrics.clone();
        assert_eq!(snapshot.submitted(), 1);
        assert_eq!(snapshot.completed(), 1);

        // Original and clone are independent
        metrics.record_submitted();
        assert_eq!(metrics.submitted(), 2);
        assert_eq!(snapshot.submitted(), 1);
    }
}
