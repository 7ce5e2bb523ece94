//! Timer state for the running countdown

use super::SessionKind;

/// Snapshot of the countdown, published on every engine state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    /// Id of the session this snapshot belongs to
    pub session_id: Option<u64>,
    pub kind: Option<SessionKind>,
    /// Tick units left before the session completes
    pub remaining_ticks: Option<u64>,
    pub paused: bool,
}

impl TimerState {
    /// Create an inactive timer state
    pub fn new() -> Self {
        Self::inactive()
    }

    /// Create an active timer state with remaining ticks
    pub fn active(session_id: u64, kind: SessionKind, remaining_ticks: u64, paused: bool) -> Self {
        Self {
            session_id: Some(session_id),
            kind: Some(kind),
            remaining_ticks: Some(remaining_ticks),
            paused,
        }
    }

    /// Create an inactive timer state
    pub fn inactive() -> Self {
        Self {
            session_id: None,
            kind: None,
            remaining_ticks: None,
            paused: false,
        }
    }

    /// Check if a countdown is running
    pub fn is_active(&self) -> bool {
        self.session_id.is_some()
    }

    /// Get remaining ticks if timer is active
    pub fn remaining_ticks(&self) -> Option<u64> {
        if self.is_active() {
            self.remaining_ticks
        } else {
            None
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}
