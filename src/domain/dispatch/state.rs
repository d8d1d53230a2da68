//! Dispatch loop state machine

use std::fmt;
use thiserror::Error;

/// Dispatch loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DispatchState {
    /// Blocked on a bus read
    #[default]
    Idle,
    /// One event is being matched and handled
    Processing,
}

impl DispatchState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: DispatchState,
    pub action: String,
}

/// Dispatch session entity.
///
/// State machine:
///   IDLE -> PROCESSING (begin)
///   PROCESSING -> IDLE (finish)
#[derive(Debug, Default)]
pub struct DispatchSession {
    state: DispatchState,
    processed: u64,
}

impl DispatchSession {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Check if currently idle
    pub fn is_idle(&self) -> bool {
        self.state == DispatchState::Idle
    }

    /// Check if currently processing
    pub fn is_processing(&self) -> bool {
        self.state == DispatchState::Processing
    }

    /// Number of events that went through a full processing cycle
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Transition from IDLE to PROCESSING
    pub fn begin(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != DispatchState::Idle {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "begin processing".to_string(),
            });
        }
        self.state = DispatchState::Processing;
        Ok(())
    }

    /// Transition from PROCESSING to IDLE
    pub fn finish(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != DispatchState::Processing {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "finish processing".to_string(),
            });
        }
        self.state = DispatchState::Idle;
        self.processed += 1;
        Ok(())
    }
}
