//! Error types for the work queue system

use super::state::QueueState;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, WorkQueueError>;

#[derive(Debug, thiserror::Error)]
pub enum WorkQueueError {
    /// Invalid configuration with details
    #[error("Invalid configuration for {parameter}: {message}")]
    InvalidConfiguration { parameter: String, message: String },

    /// Submission rejected because shutdown has begun
    #[error("Queue is {state}, no longer accepting submissions")]
    QueueClosed { state: QueueState },

    /// Non-blocking submission found no buffer space
    #[error("Queue buffer full: {capacity} items pending")]
    QueueFull { capacity: usize },

    /// Blocking call gave up after its deadline
    #[error("Operation timed out after {waited:?}")]
    Timeout { waited: Duration },

    /// Result channel closed before an outcome arrived
    #[error("Result channel disconnected before an outcome was delivered")]
    ResultChannelClosed,
}

impl WorkQueueError {
    /// Create an invalid configuration error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        WorkQueueError::InvalidConfiguration {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a queue closed error for the given state
    pub fn closed(state: QueueState) -> Self {
        WorkQueueError::QueueClosed { state }
    }

    /// Create a queue full error
    pub fn full(capacity: usize) -> Self {
        WorkQueueError::QueueFull { capacity }
    }

    /// Create a timeout error
    pub fn timeout(waited: Duration) -> Self {
        WorkQueueError::Timeout { waited }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = WorkQueueError::invalid_config("worker_count", "must be at least 1");
        assert!(matches!(err, WorkQueueError::InvalidConfiguration { .. }));

        let err = WorkQueueError::closed(QueueState::Draining);
        assert!(matches!(err, WorkQueueError::QueueClosed { .. }));

        let err = WorkQueueError::full(16);
        assert!(matches!(err, WorkQueueError::QueueFull { capacity: 16 }));
    }

    #[test]
    fn test_error_display() {
        let err = WorkQueueError::invalid_config("worker_count", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for worker_count: must be at least 1"
        );

        let err = WorkQueueError::closed(QueueState::Closed);
        assert_eq!(
            err.to_string(),
            "Queue is Closed, no longer accepting submissions"
        );

        let err = WorkQueueError::timeout(Duration::from_millis(50));
        assert_eq!(err.to_string(), "Operation timed out after 50ms");
    }
}
