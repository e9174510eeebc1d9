//! Cooperative cancellation signal shared between the queue and its jobs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Broadcast cancellation token
///
/// The queue hands a clone of its token to every job it executes. Jobs that
/// run for a long time should poll [`is_cancelled`](CancelToken::is_cancelled)
/// at safe points and return early when it fires; short jobs may ignore it.
/// There is no pre-emptive interruption.
///
/// # Example
///
/// ```
/// use rust_workqueue_system::CancelToken;
///
/// let token = CancelToken::new();
/// assert!(!token.is_cancelled());
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fire the signal; all clones observe it
    ///
    /// Idempotent and safe to call from any thread.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
