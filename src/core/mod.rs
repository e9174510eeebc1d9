//! Core work queue types and traits

pub mod cancel;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod state;
pub mod task;

pub use cancel::CancelToken;
pub use error::{Result, WorkQueueError};
pub use metrics::QueueMetrics;
pub use queue::{WorkQueue, WorkQueueBuilder, DEFAULT_CLOSE_TIMEOUT};
pub use state::QueueState;
pub use task::{Job, JobError, Outcome, TaskFault, TaskHandle};
