//! Access session state machine.
//!
//! Tracks where the controller is within a presence session and rejects
//! out-of-order steps.
//!
//! # States
//!
//! - `Idle`: polling the presence monitor
//! - `AwaitingCamera`: presence detected, camera acquired, waiting for the
//!   operator to pick a workflow
//! - `InWorkflow`: running enrollment or verification
//!
//! # Valid Transitions
//!
//! - Idle → AwaitingCamera → InWorkflow → Idle
//! - AwaitingCamera → Idle (invalid selection, console closed)
//!
//! # Examples
//!
//! ```
//! use facegate_engine::{SessionState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), &SessionState::Idle);
//!
//! machine.transition_to(SessionState::AwaitingCamera).unwrap();
//! assert!(machine.transition_to(SessionState::AwaitingCamera).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;

use facegate_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maximum number of state transitions to keep in history.
///
/// A session is three transitions, so this covers the last few dozen
/// sessions.
const MAX_HISTORY_SIZE: usize = 100;

/// Phase of the access controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for a subject to come within range.
    Idle,

    /// Camera held, operator choosing a workflow.
    AwaitingCamera,

    /// Enrollment or verification in progress.
    InWorkflow,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            SessionState::Idle => "Idle",
            SessionState::AwaitingCamera => "AwaitingCamera",
            SessionState::InWorkflow => "InWorkflow",
        };
        write!(f, "{}", state_str)
    }
}

impl SessionState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use facegate_engine::SessionState;
    ///
    /// assert!(SessionState::Idle.can_transition_to(&SessionState::AwaitingCamera));
    /// assert!(!SessionState::Idle.can_transition_to(&SessionState::InWorkflow));
    /// ```
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            (SessionState::Idle, SessionState::AwaitingCamera)
                | (SessionState::AwaitingCamera, SessionState::InWorkflow | SessionState::Idle)
                | (SessionState::InWorkflow, SessionState::Idle)
        )
    }
}

/// A single recorded state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SessionState,
    pub to: SessionState,
}

/// State machine for the presence session lifecycle.
///
/// Not thread-safe; the controller owns it exclusively.
#[derive(Debug)]
pub struct StateMachine {
    current_state: SessionState,

    /// Recent transitions, oldest first (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self {
            current_state: SessionState::Idle,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> &SessionState {
        &self.current_state
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] if the transition is not
    /// allowed from the current state. The machine is left unchanged.
    pub fn transition_to(&mut self, new_state: SessionState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }
        Ok(self.change_state(new_state))
    }

    /// Force the machine back to Idle regardless of the current state.
    ///
    /// Used when a session is torn down by an error or an interrupt.
    pub fn reset(&mut self) -> StateTransition {
        self.change_state(SessionState::Idle)
    }

    fn change_state(&mut self, new_state: SessionState) -> StateTransition {
        let transition = StateTransition {
            from: self.current_state,
            to: new_state,
        };
        self.current_state = new_state;
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        transition
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
