//! Run state machine
//!
//! The state owned by a ScriptRunner for the duration of one run.
//! Transitions: Idle -> Running -> {Paused <-> Running} ->
//! {Completed | Cancelled | Errored} -> (acknowledged) -> Idle.

use serde::{Deserialize, Serialize};

/// Execution state of a script run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run in progress; also the state after a terminal state is acknowledged
    #[default]
    Idle,

    /// Lines are being interpreted
    Running,

    /// Execution suspended at a line boundary, waiting for resume or cancel
    Paused,

    /// Run stopped by an explicit cancel request
    Cancelled,

    /// Every line executed
    Completed,

    /// Run halted by a fatal runtime failure (wait timeout, device error)
    Errored,
}

impl RunState {
    /// Whether a run is in progress (running or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Running | RunState::Paused)
    }

    /// Whether the run has reached a final state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Cancelled | RunState::Completed | RunState::Errored
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_states() {
        assert!(RunState::Running.is_active());
        assert!(RunState::Paused.is_active());
        assert!(!RunState::Idle.is_active());
        assert!(!RunState::Completed.is_active());
    }

    #[test]
    fn test_terminal_states() {
        assert!(RunState::Cancelled.is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Errored.is_terminal());
        assert!(!RunState::Idle.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(!RunState::Paused.is_terminal());
    }
}
