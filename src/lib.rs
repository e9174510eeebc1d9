//! # Rust Workqueue System
//!
//! A bounded, concurrent, cancellable work queue: multiple producers submit
//! jobs, a fixed pool of worker threads executes them, and every accepted
//! item receives exactly one per-item outcome.
//!
//! ## Features
//!
//! - **Backpressure**: blocking submission on a full buffer, with optional
//!   deadline and non-blocking variants
//! - **Graceful Shutdown**: drain-then-close, an immediate cancelling close,
//!   and a bounded-time close on drop
//! - **Fault Isolation**: panicking jobs become `Failure` outcomes, never
//!   dead workers
//! - **Observable**: atomic metrics and an injectable diagnostic logger
//!
//! ## Quick start
//!
//! ```
//! use rust_workqueue_system::WorkQueue;
//!
//! let queue = WorkQueue::new(4, 32).unwrap();
//! let handle = queue.submit(|_| Ok(2 + 2)).unwrap();
//! assert!(handle.wait().unwrap().is_success());
//! queue.close();
//! ```

pub mod core;
pub mod logging;

pub mod prelude {
    pub use crate::core::{
        CancelToken, Job, JobError, Outcome, QueueMetrics, QueueState, Result, TaskFault,
        TaskHandle, WorkQueue, WorkQueueBuilder, WorkQueueError, DEFAULT_CLOSE_TIMEOUT,
    };
    pub use crate::logging::{ConsoleLogger, LogLevel, LoggerConfig, NopLogger, QueueLogger};
}

pub use core::{
    CancelToken, Job, JobError, Outcome, QueueMetrics, QueueState, Result, TaskFault, TaskHandle,
    WorkQueue, WorkQueueBuilder, WorkQueueError, DEFAULT_CLOSE_TIMEOUT,
};
pub use logging::{ConsoleLogger, LogLevel, LoggerConfig, NopLogger, QueueLogger};
