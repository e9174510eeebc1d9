//! Work items, per-item outcomes, and the handles used to collect them

use super::cancel::CancelToken;
use super::error::{Result, WorkQueueError};
use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Boxed error type jobs may return
pub type JobError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A unit of work
///
/// The closure receives the queue's [`CancelToken`] so cooperative jobs can
/// bail out early during an immediate shutdown.
pub type Job<T> = Box<dyn FnOnce(&CancelToken) -> std::result::Result<T, JobError> + Send + 'static>;

/// Why a work item produced no value
#[derive(Debug, thiserror::Error)]
pub enum TaskFault {
    /// The job ran and returned an error
    #[error("Task failed: {0}")]
    Failed(#[source] JobError),

    /// The job panicked; the payload was captured at the worker boundary
    #[error("Task panicked: {0}")]
    Panicked(String),

    /// The item was abandoned before execution by an immediate shutdown
    #[error("Task cancelled before execution")]
    Cancelled,
}

impl TaskFault {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskFault::Cancelled)
    }
}

/// Per-item result, delivered exactly once per submitted item
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Failure(TaskFault),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// Convert into a plain `Result`, discarding nothing
    pub fn into_result(self) -> std::result::Result<T, TaskFault> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(fault) => Err(fault),
        }
    }
}

/// A submitted item as it travels through the pending buffer
///
/// Owned by the queue from submission until a worker claims it; the worker
/// consumes it when reporting the outcome.
pub(crate) struct TaskEnvelope<T> {
    pub(crate) id: u64,
    pub(crate) enqueued_at: DateTime<Utc>,
    pub(crate) job: Job<T>,
    pub(crate) result_tx: Sender<Outcome<T>>,
}

impl<T> TaskEnvelope<T> {
    pub(crate) fn new(id: u64, job: Job<T>) -> (Self, TaskHandle<T>) {
        // One-shot: the worker sends exactly once, the handle receives at most once
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);
        let enqueued_at = Utc::now();
        let envelope = Self {
            id,
            enqueued_at,
            job,
            result_tx,
        };
        let handle = TaskHandle {
            id,
            enqueued_at,
            result_rx,
        };
        (envelope, handle)
    }

    /// Deliver the outcome, consuming the envelope
    ///
    /// A dropped handle still counts as delivered; the send error is ignored.
    pub(crate) fn report(self, outcome: Outcome<T>) {
        let _ = self.result_tx.send(outcome);
    }
}

/// Caller-side handle for one submitted item
///
/// # Example
///
/// ```
/// use rust_workqueue_system::WorkQueue;
///
/// let queue = WorkQueue::new(1, 4).unwrap();
/// let handle = queue.submit(|_| Ok(21 * 2)).unwrap();
/// let outcome = handle.wait().unwrap();
/// assert!(outcome.is_success());
/// ```
#[derive(Debug)]
pub struct TaskHandle<T> {
    id: u64,
    enqueued_at: DateTime<Utc>,
    result_rx: Receiver<Outcome<T>>,
}

impl<T> TaskHandle<T> {
    /// Sequence id assigned at submission (monotonic per queue)
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    /// Block until the outcome arrives
    pub fn wait(self) -> Result<Outcome<T>> {
        self.result_rx
            .recv()
            .map_err(|_| WorkQueueError::ResultChannelClosed)
    }

    /// Block until the outcome arrives or the deadline passes
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Outcome<T>> {
        self.result_rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => WorkQueueError::timeout(timeout),
            RecvTimeoutError::Disconnected => WorkQueueError::ResultChannelClosed,
        })
    }

    /// Non-blocking poll for the outcome
    pub fn try_outcome(&self) -> Option<Outcome<T>> {
        self.result_rx.try_recv().ok()
    }
}
