//! Main work queue implementation

use super::{
    cancel::CancelToken,
    error::{Result, WorkQueueError},
    metrics::QueueMetrics,
    state::{AtomicState, QueueState},
    task::{Job, JobError, Outcome, TaskEnvelope, TaskFault, TaskHandle},
};
use crate::logging::{NopLogger, QueueLogger};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default drain timeout used when the queue is dropped without an explicit close (5 seconds)
///
/// For custom timeout control, use [`WorkQueue::close_timeout`] instead.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bounded, concurrent, cancellable work queue
///
/// Multiple producers submit jobs; a fixed pool of worker threads executes
/// them off one shared bounded buffer. Every accepted item receives exactly
/// one [`Outcome`] through its [`TaskHandle`], including items abandoned by
/// an immediate shutdown. Completion order across items is not guaranteed;
/// use the handle for per-item correlation.
///
/// # Example
///
/// ```
/// use rust_workqueue_system::WorkQueue;
///
/// let queue = WorkQueue::new(2, 8).unwrap();
/// let handle = queue.submit(|_| Ok("done")).unwrap();
/// assert!(handle.wait().unwrap().is_success());
/// queue.close();
/// ```
pub struct WorkQueue<T: Send + 'static> {
    /// Shared with the workers: the last one out completes `Draining -> Closed`
    state: Arc<AtomicState>,
    /// The sole persistent sender; taken on close so workers see disconnect.
    /// Submission clones it under the read lock, closing takes it under the
    /// write lock, which is what serializes submit against close.
    sender: RwLock<Option<Sender<TaskEnvelope<T>>>>,
    /// Receiver clone kept for `len()` only; workers hold their own clones
    pending: Receiver<TaskEnvelope<T>>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    token: CancelToken,
    metrics: Arc<QueueMetrics>,
    logger: Arc<dyn QueueLogger>,
    next_id: AtomicU64,
    worker_count: usize,
    capacity: usize,
}

impl<T: Send + 'static> WorkQueue<T> {
    /// Create a queue with `worker_count` workers and a pending buffer of
    /// `buffer_capacity` items
    ///
    /// `worker_count` must be at least 1. A capacity of 0 gives rendezvous
    /// semantics: every submission hands off directly to an idle worker.
    /// All workers are spawned immediately, parked on the empty buffer.
    pub fn new(worker_count: usize, buffer_capacity: usize) -> Result<Self> {
        Self::with_logger(worker_count, buffer_capacity, Arc::new(NopLogger))
    }

    /// Create a queue with an injected diagnostic logger
    ///
    /// The queue reports worker panics, drain progress, and shutdown events
    /// through the logger. It never configures logging itself.
    pub fn with_logger(
        worker_count: usize,
        buffer_capacity: usize,
        logger: Arc<dyn QueueLogger>,
    ) -> Result<Self> {
        if worker_count == 0 {
            return Err(WorkQueueError::invalid_config(
                "worker_count",
                "must be at least 1",
            ));
        }

        let (sender, receiver) = bounded(buffer_capacity);
        let token = CancelToken::new();
        let metrics = Arc::new(QueueMetrics::new());
        let state = Arc::new(AtomicState::new(QueueState::Open));
        let live_workers = Arc::new(AtomicUsize::new(worker_count));

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let receiver: Receiver<TaskEnvelope<T>> = receiver.clone();
            let token = token.clone();
            let metrics = Arc::clone(&metrics);
            let logger = Arc::clone(&logger);
            let state = Arc::clone(&state);
            let live_workers = Arc::clone(&live_workers);
            handles.push(thread::spawn(move || {
                worker_loop(
                    worker_id,
                    &receiver,
                    &token,
                    &metrics,
                    logger.as_ref(),
                    &state,
                    &live_workers,
                );
            }));
        }

        logger.debug(&format!(
            "work queue started: {} workers, buffer capacity {}",
            worker_count, buffer_capacity
        ));

        Ok(Self {
            state,
            sender: RwLock::new(Some(sender)),
            pending: receiver,
            workers: Mutex::new(handles),
            token,
            metrics,
            logger,
            next_id: AtomicU64::new(0),
            worker_count,
            capacity: buffer_capacity,
        })
    }

    /// Create a builder for `WorkQueue`
    ///
    /// # Example
    /// ```
    /// use rust_workqueue_system::WorkQueue;
    ///
    /// let queue = WorkQueue::<u32>::builder()
    ///     .workers(4)
    ///     .capacity(64)
    ///     .build()
    ///     .unwrap();
    /// queue.close();
    /// ```
    #[must_use]
    pub fn builder() -> WorkQueueBuilder<T> {
        WorkQueueBuilder::new()
    }

    /// Submit a job, blocking while the buffer is full
    ///
    /// Applies backpressure: the caller suspends until a worker frees buffer
    /// space. Fails immediately with `QueueClosed` once shutdown has begun —
    /// this path never blocks on a closing queue.
    pub fn submit<F>(&self, job: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce(&CancelToken) -> std::result::Result<T, JobError> + Send + 'static,
    {
        let sender = self.live_sender()?;
        let (envelope, handle) = self.make_envelope(Box::new(job));
        match sender.send(envelope) {
            Ok(()) => {
                self.metrics.record_submitted();
                Ok(handle)
            }
            Err(_) => {
                self.metrics.record_rejected();
                Err(WorkQueueError::closed(self.state()))
            }
        }
    }

    /// Submit a job, waiting at most `timeout` for buffer space
    ///
    /// On expiry the item is discarded and `Timeout` is returned; queue state
    /// is unchanged.
    pub fn submit_timeout<F>(&self, job: F, timeout: Duration) -> Result<TaskHandle<T>>
    where
        F: FnOnce(&CancelToken) -> std::result::Result<T, JobError> + Send + 'static,
    {
        let sender = self.live_sender()?;
        let (envelope, handle) = self.make_envelope(Box::new(job));
        match sender.send_timeout(envelope, timeout) {
            Ok(()) => {
                self.metrics.record_submitted();
                Ok(handle)
            }
            Err(SendTimeoutError::Timeout(_)) => {
                self.metrics.record_submit_timeout();
                Err(WorkQueueError::timeout(timeout))
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                self.metrics.record_rejected();
                Err(WorkQueueError::closed(self.state()))
            }
        }
    }

    /// Submit a job without blocking
    ///
    /// Returns `QueueFull` when no buffer space is available right now.
    pub fn try_submit<F>(&self, job: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce(&CancelToken) -> std::result::Result<T, JobError> + Send + 'static,
    {
        let sender = self.live_sender()?;
        let (envelope, handle) = self.make_envelope(Box::new(job));
        match sender.try_send(envelope) {
            Ok(()) => {
                self.metrics.record_submitted();
                Ok(handle)
            }
            Err(TrySendError::Full(_)) => Err(WorkQueueError::full(self.capacity)),
            Err(TrySendError::Disconnected(_)) => {
                self.metrics.record_rejected();
                Err(WorkQueueError::closed(self.state()))
            }
        }
    }

    /// Gracefully close the queue
    ///
    /// Stops accepting submissions, waits for the pending buffer to empty and
    /// all in-flight items to finish, then joins the workers. Idempotent:
    /// every caller returns once the queue reaches `Closed`.
    pub fn close(&self) {
        self.begin_drain(false);
        self.finish_close(None);
    }

    /// Gracefully close, giving up after `timeout`
    ///
    /// Returns `true` if the drain completed within the deadline. On `false`
    /// the queue stays `Draining` while the workers keep delivering pending
    /// items; the last one out moves the state to `Closed`, and any later
    /// close call joins the remaining worker threads.
    pub fn close_timeout(&self, timeout: Duration) -> bool {
        self.begin_drain(false);
        self.finish_close(Some(timeout))
    }

    /// Immediately shut down the queue
    ///
    /// Stops accepting submissions, broadcasts the cancel token, and lets the
    /// workers flush the remaining buffer: every not-yet-started item is
    /// reported as `Failure(Cancelled)` without executing. In-flight jobs are
    /// expected to honor the token cooperatively; they are still waited for.
    pub fn close_now(&self) {
        self.logger
            .warning("immediate shutdown requested, cancelling pending work");
        self.begin_drain(true);
        self.finish_close(None);
    }

    /// Number of items waiting in the pending buffer
    ///
    /// Does not include items currently executing on workers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether the queue has reached the terminal `Closed` state
    pub fn is_closed(&self) -> bool {
        self.state() == QueueState::Closed
    }

    pub fn state(&self) -> QueueState {
        self.state.load()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cancel token shared with every job
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Queue metrics for observability
    ///
    /// # Example
    ///
    /// ```
    /// use rust_workqueue_system::WorkQueue;
    ///
    /// let queue = WorkQueue::new(1, 4).unwrap();
    /// queue.submit(|_| Ok(())).unwrap().wait().unwrap();
    /// assert_eq!(queue.metrics().submitted(), 1);
    /// queue.close();
    /// ```
    pub fn metrics(&self) -> &QueueMetrics {
        &self.metrics
    }

    fn make_envelope(&self, job: Job<T>) -> (TaskEnvelope<T>, TaskHandle<T>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        TaskEnvelope::new(id, job)
    }

    /// Clone the live sender if the queue is still accepting submissions
    ///
    /// The state check happens under the same read lock that close's write
    /// lock excludes, so a submission can never slip past a completed close.
    fn live_sender(&self) -> Result<Sender<TaskEnvelope<T>>> {
        let guard = self.sender.read();
        let state = self.state.load();
        if state != QueueState::Open {
            self.metrics.record_rejected();
            return Err(WorkQueueError::closed(state));
        }
        match guard.as_ref() {
            Some(sender) => Ok(sender.clone()),
            None => {
                self.metrics.record_rejected();
                Err(WorkQueueError::closed(state))
            }
        }
    }

    /// Stop accepting submissions and disconnect the workers' feed
    ///
    /// With `cancel` set the token fires first, so workers flush everything
    /// still buffered as `Failure(Cancelled)` instead of executing it.
    fn begin_drain(&self, cancel: bool) {
        if cancel {
            self.token.cancel();
        }
        let mut guard = self.sender.write();
        if self.state.transition(QueueState::Open, QueueState::Draining).is_ok() {
            self.logger.info("work queue draining");
        }
        // Dropping the last persistent sender disconnects the channel once
        // the buffer empties; parked workers wake and exit.
        drop(guard.take());
    }

    /// Join the workers and finish the `Draining -> Closed` transition
    ///
    /// Only one caller gets the handles; concurrent closers wait for the
    /// state to reach `Closed` instead.
    fn finish_close(&self, timeout: Option<Duration>) -> bool {
        let mut handles = std::mem::take(&mut *self.workers.lock());
        if handles.is_empty() {
            return self.wait_closed(timeout);
        }

        let start = Instant::now();
        while let Some(handle) = handles.pop() {
            match timeout {
                None => {
                    if handle.join().is_err() {
                        self.logger.error("worker thread panicked during shutdown");
                    }
                }
                Some(limit) => {
                    while !handle.is_finished() {
                        if start.elapsed() >= limit {
                            // Hand the unjoined workers back so a later
                            // closer can finish the join once the drain
                            // completes; the last exiting worker performs
                            // the Closed transition either way.
                            handles.push(handle);
                            self.workers.lock().extend(handles);
                            self.logger.warning(
                                "work queue drain did not finish within timeout",
                            );
                            return false;
                        }
                        thread::sleep(Duration::from_millis(10));
                    }
                    if handle.join().is_err() {
                        self.logger.error("worker thread panicked during shutdown");
                    }
                }
            }
        }

        // Normally already done by the last exiting worker; covers the case
        // of a worker thread that died abnormally and never decremented the
        // live count.
        let _ = self
            .state
            .transition(QueueState::Draining, QueueState::Closed);
        self.logger.info("work queue closed");
        true
    }

    /// Wait for a concurrent closer to finish the drain
    fn wait_closed(&self, timeout: Option<Duration>) -> bool {
        let start = Instant::now();
        while self.state.load() != QueueState::Closed {
            if let Some(limit) = timeout {
                if start.elapsed() >= limit {
                    return false;
                }
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }
}

impl<T: Send + 'static> std::fmt::Debug for WorkQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("worker_count", &self.worker_count)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Drop for WorkQueue<T> {
    fn drop(&mut self) {
        if self.is_closed() {
            return;
        }

        self.begin_drain(false);
        if !self.finish_close(Some(DEFAULT_CLOSE_TIMEOUT)) {
            self.logger.warning(&format!(
                "work queue dropped before drain finished ({:?} timeout)",
                DEFAULT_CLOSE_TIMEOUT
            ));
        }
    }
}

/// Worker body: pull, execute, report, repeat
///
/// Exits when the channel disconnects with nothing pending. Faults never
/// unwind past this function; a panicking job is captured and converted into
/// a `Failure` outcome at this boundary.
fn worker_loop<T: Send + 'static>(
    worker_id: usize,
    receiver: &Receiver<TaskEnvelope<T>>,
    token: &CancelToken,
    metrics: &QueueMetrics,
    logger: &dyn QueueLogger,
    state: &AtomicState,
    live_workers: &AtomicUsize,
) {
    while let Ok(envelope) = receiver.recv() {
        if token.is_cancelled() {
            metrics.record_cancelled();
            envelope.report(Outcome::Failure(TaskFault::Cancelled));
            continue;
        }

        let TaskEnvelope {
            id, job, result_tx, ..
        } = envelope;

        metrics.enter_flight();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| job(token)));
        metrics.exit_flight();

        let outcome = match result {
            Ok(Ok(value)) => {
                metrics.record_completed();
                Outcome::Success(value)
            }
            Ok(Err(err)) => {
                metrics.record_failed();
                logger.debug(&format!("worker {}: task {} failed: {}", worker_id, id, err));
                Outcome::Failure(TaskFault::Failed(err))
            }
            Err(panic_info) => {
                let message = panic_message(panic_info);
                metrics.record_panicked();
                logger.error(&format!(
                    "worker {}: task {} panicked: {}",
                    worker_id, id, message
                ));
                Outcome::Failure(TaskFault::Panicked(message))
            }
        };

        // A dropped handle still counts as delivered
        let _ = result_tx.send(outcome);
    }

    // The channel only disconnects after the closer moved the state to
    // Draining, so the last worker out can always complete the transition.
    // This keeps closers that gave up on a timed join from stranding the
    // queue in Draining.
    if live_workers.fetch_sub(1, Ordering::AcqRel) == 1 {
        let _ = state.transition(QueueState::Draining, QueueState::Closed);
    }

    logger.debug(&format!("worker {} exiting", worker_id));
}

/// Extract a human-readable message from a panic payload
fn panic_message(panic_info: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Builder for constructing a [`WorkQueue`] with a fluent API
///
/// # Example
/// ```
/// use rust_workqueue_system::{ConsoleLogger, WorkQueue};
/// use std::sync::Arc;
///
/// let queue = WorkQueue::<()>::builder()
///     .workers(2)
///     .capacity(16)
///     .logger(Arc::new(ConsoleLogger::with_prefix("WORKQUEUE")))
///     .build()
///     .unwrap();
/// queue.close();
/// ```
pub struct WorkQueueBuilder<T: Send + 'static> {
    worker_count: usize,
    buffer_capacity: usize,
    logger: Option<Arc<dyn QueueLogger>>,
    _outcome: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> WorkQueueBuilder<T> {
    /// Create a new builder with default values
    ///
    /// Defaults: one worker, rendezvous buffer (capacity 0), no-op logger.
    pub fn new() -> Self {
        Self {
            worker_count: 1,
            buffer_capacity: 0,
            logger: None,
            _outcome: PhantomData,
        }
    }

    /// Set the worker pool size
    #[must_use = "builder methods return a new value"]
    pub fn workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the pending buffer capacity (0 means synchronous hand-off)
    #[must_use = "builder methods return a new value"]
    pub fn capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    /// Inject the diagnostic logger
    #[must_use = "builder methods return a new value"]
    pub fn logger(mut self, logger: Arc<dyn QueueLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Build the queue, spawning its workers
    pub fn build(self) -> Result<WorkQueue<T>> {
        let logger = self.logger.unwrap_or_else(|| Arc::new(NopLogger));
        WorkQueue::with_logger(self.worker_count, self.buffer_capacity, logger)
    }
}

impl<T: Send + 'static> Default for WorkQueueBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_workers() {
        let err = WorkQueue::<()>::new(0, 4).unwrap_err();
        assert!(matches!(err, WorkQueueError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_builder_basic() {
        let queue = WorkQueue::<u32>::builder()
            .workers(2)
            .capacity(8)
            .build()
            .unwrap();
        assert_eq!(queue.worker_count(), 2);
        assert_eq!(queue.capacity(), 8);
        assert_eq!(queue.state(), QueueState::Open);
        queue.close();
    }

    #[test]
    fn test_builder_default_is_valid() {
        let queue = WorkQueueBuilder::<()>::default().build().unwrap();
        assert_eq!(queue.worker_count(), 1);
        assert_eq!(queue.capacity(), 0);
        queue.close();
    }

    #[test]
    fn test_submit_and_wait() {
        let queue = WorkQueue::new(2, 4).unwrap();
        let handle = queue.submit(|_| Ok(5 * 5)).unwrap();
        let outcome = handle.wait().unwrap();
        assert!(matches!(outcome, Outcome::Success(25)));
        queue.close();
    }

    #[test]
    fn test_sequence_ids_are_monotonic() {
        let queue = WorkQueue::new(1, 8).unwrap();
        let first = queue.submit(|_| Ok(())).unwrap();
        let second = queue.submit(|_| Ok(())).unwrap();
        assert!(second.id() > first.id());
        queue.close();
    }

    #[test]
    fn test_job_error_becomes_failure_outcome() {
        let queue = WorkQueue::<()>::new(1, 1).unwrap();
        let handle = queue
            .submit(|_| Err("deliberate failure".into()))
            .unwrap();
        let outcome = handle.wait().unwrap();
        match outcome {
            Outcome::Failure(TaskFault::Failed(err)) => {
                assert_eq!(err.to_string(), "deliberate failure");
            }
            other => panic!("expected Failed fault, got {:?}", other.is_success()),
        }
        queue.close();
    }

    #[test]
    fn test_panic_captured_as_failure() {
        let queue = WorkQueue::<()>::new(1, 1).unwrap();
        let handle = queue.submit(|_| panic!("boom")).unwrap();
        let outcome = handle.wait().unwrap();
        match outcome {
            Outcome::Failure(TaskFault::Panicked(message)) => {
                assert!(message.contains("boom"));
            }
            _ => panic!("expected Panicked fault"),
        }

        // The worker survived the panic and keeps processing
        let handle = queue.submit(|_| Ok(())).unwrap();
        assert!(handle.wait().unwrap().is_success());
        assert_eq!(queue.metrics().panicked(), 1);
        queue.close();
    }

    #[test]
    fn test_close_is_idempotent() {
        let queue = WorkQueue::<()>::new(1, 2).unwrap();
        queue.close();
        assert!(queue.is_closed());
        queue.close();
        assert!(queue.is_closed());
    }

    #[test]
    fn test_submit_after_close_fails_fast() {
        let queue = WorkQueue::<()>::new(1, 2).unwrap();
        queue.close();
        let err = queue.submit(|_| Ok(())).unwrap_err();
        assert!(matches!(err, WorkQueueError::QueueClosed { .. }));
        assert_eq!(queue.metrics().rejected(), 1);
    }

    #[test]
    fn test_try_submit_full() {
        let queue = WorkQueue::new(1, 1).unwrap();
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);

        // Occupy the worker, then the single buffer slot
        let busy = queue
            .submit(move |_| {
                release_rx.recv().ok();
                Ok(1)
            })
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        let buffered = queue.submit(|_| Ok(2)).unwrap();

        let err = queue.try_submit(|_| Ok(3)).unwrap_err();
        assert!(matches!(err, WorkQueueError::QueueFull { capacity: 1 }));

        release_tx.send(()).unwrap();
        assert!(busy.wait().unwrap().is_success());
        assert!(buffered.wait().unwrap().is_success());
        queue.close();
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("str payload");
        assert_eq!(panic_message(payload), "str payload");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("string payload"));
        assert_eq!(panic_message(payload), "string payload");

        let payload: Box<dyn std::any::Any + Send> = Box::new(17_u8);
        assert_eq!(panic_message(payload), "Unknown panic");
    }
}
