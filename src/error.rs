//! Error types for the runner core

use thiserror::Error;

use crate::game::{Command, GameState};

/// Runner state machine errors
///
/// The state machine accepts exactly the commands listed in
/// [`GameState::on`]; anything else is a defect in the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerError {
    #[error("Invalid transition: {command:?} is not accepted in {state:?}")]
    InvalidTransition { state: GameState, command: Command },
}

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("game.min_gap ({min}) exceeds game.max_gap ({max})")]
    GapRange { min: f32, max: f32 },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Recoverable input-side conditions; the game keeps running on the keyboard
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFault {
    #[error("pose unavailable, keyboard fallback")]
    PoseUnavailable,

    #[error("calibration failed, keyboard only for this session")]
    CalibrationFailed,
}
