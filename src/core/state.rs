//! Queue lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a work queue
///
/// Legal transitions: `Open -> Draining -> Closed`. An immediate shutdown
/// still passes through `Draining` internally while buffered items are
/// flushed out as cancelled. Nothing leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QueueState {
    /// Accepting submissions
    Open = 0,
    /// No new submissions; pending and in-flight items still finishing
    Draining = 1,
    /// Terminal; buffer empty, all workers exited
    Closed = 2,
}

impl QueueState {
    pub fn to_str(&self) -> &'static str {
        match self {
            QueueState::Open => "Open",
            QueueState::Draining => "Draining",
            QueueState::Closed => "Closed",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => QueueState::Open,
            1 => QueueState::Draining,
            _ => QueueState::Closed,
        }
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Atomic cell holding a [`QueueState`]
///
/// All transitions go through [`transition`](AtomicState::transition) so that
/// racing submit/close callers agree on a single winner.
#[derive(Debug)]
pub struct AtomicState(AtomicU8);

impl AtomicState {
    pub const fn new(state: QueueState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub fn load(&self) -> QueueState {
        QueueState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Attempt the transition `from -> to`
    ///
    /// Returns `Ok(())` if this caller won the transition, or the state that
    /// was actually observed if it had already moved on.
    pub fn transition(&self, from: QueueState, to: QueueState) -> std::result::Result<(), QueueState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(QueueState::from_u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(QueueState::Open.to_string(), "Open");
        assert_eq!(QueueState::Draining.to_string(), "Draining");
        assert_eq!(QueueState::Closed.to_string(), "Closed");
    }

    #[test]
    fn test_state_ordering() {
        assert!(QueueState::Open < QueueState::Draining);
        assert!(QueueState::Draining < QueueState::Closed);
    }

    #[test]
    fn test_transition_winner() {
        let state = AtomicState::new(QueueState::Open);
        assert!(state.transition(QueueState::Open, QueueState::Draining).is_ok());
        assert_eq!(state.load(), QueueState::Draining);
    }

    #[test]
    fn test_transition_loser_sees_current() {
        let state = AtomicState::new(QueueState::Open);
        state
            .transition(QueueState::Open, QueueState::Draining)
            .expect("first transition");

        // Second attempt from Open must fail and report where we really are
        let observed = state
            .transition(QueueState::Open, QueueState::Draining)
            .unwrap_err();
        assert_eq!(observed, QueueState::Draining);
    }

    #[test]
    fn test_no_transition_leaves_closed() {
        let state = AtomicState::new(QueueState::Closed);
        assert!(state.transition(QueueState::Open, QueueState::Draining).is_err());
        assert!(state
            .transition(QueueState::Draining, QueueState::Closed)
            .is_err());
        assert_eq!(state.load(), QueueState::Closed);
    }
}
