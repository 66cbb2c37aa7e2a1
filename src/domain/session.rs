//! Recording session state machine
//!
//! At most one recording session is active at a time; exclusivity is
//! structural (a single pipeline instance), so the machine only has to keep
//! start/stop honest: {Idle, Recording} with validated transitions. Owned by
//! the session use case on the coordinator's behalf.

use std::fmt;

use thiserror::Error;

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No pipeline running; ready to start.
    Idle,
    /// Capture pipeline live; frames are being recorded.
    Recording,
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attempted transition not allowed from the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} while session is {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: &'static str,
}

/// The two-state session lifecycle with validated transitions.
#[derive(Debug)]
pub struct SessionLifecycle {
    state: SessionState,
}

impl SessionLifecycle {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Transition Idle → Recording.
    pub fn start_recording(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Recording;
                Ok(())
            }
            current_state => Err(InvalidStateTransition {
                current_state,
                action: "start recording",
            }),
        }
    }

    /// Transition Recording → Idle.
    pub fn stop_recording(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            SessionState::Recording => {
                self.state = SessionState::Idle;
                Ok(())
            }
            current_state => Err(InvalidStateTransition {
                current_state,
                action: "stop recording",
            }),
        }
    }
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
