//! Recording job state machine

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Lifecycle of one user-initiated capture
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Recording,
    AwaitingJoin,
    Composing,
    Succeeded(PathBuf),
    Failed(String),
}

impl JobState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::AwaitingJoin => "awaiting-join",
            Self::Composing => "composing",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }

    /// Succeeded or Failed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }

    /// A job occupies the pipeline from the start of recording until it
    /// reaches a terminal state
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::Recording | Self::AwaitingJoin | Self::Composing
        )
    }

    /// Output path, present only on success
    pub fn output_path(&self) -> Option<&Path> {
        match self {
            Self::Succeeded(path) => Some(path),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: JobState,
    pub action: String,
}

/// Recording job entity.
///
/// State machine:
///   IDLE | SUCCEEDED | FAILED -> RECORDING (start_recording)
///   RECORDING -> AWAITING_JOIN (stop_recording)
///   RECORDING | AWAITING_JOIN -> COMPOSING (begin_composing)
///   COMPOSING -> SUCCEEDED (succeed)
///   RECORDING | AWAITING_JOIN | COMPOSING -> FAILED (fail)
#[derive(Debug, Default)]
pub struct RecordingJob {
    state: JobState,
}

impl RecordingJob {
    pub fn new() -> Self {
        Self {
            state: JobState::Idle,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == JobState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state == JobState::Recording
    }

    pub fn is_composing(&self) -> bool {
        self.state == JobState::Composing
    }

    fn invalid(&self, action: &str) -> InvalidStateTransition {
        InvalidStateTransition {
            current_state: self.state.clone(),
            action: action.to_string(),
        }
    }

    /// Begin a new cycle. A finished job is replaced by the new one.
    pub fn start_recording(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state.is_in_progress() {
            return Err(self.invalid("start recording"));
        }
        self.state = JobState::Recording;
        Ok(())
    }

    /// Transition from RECORDING to AWAITING_JOIN
    pub fn stop_recording(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != JobState::Recording {
            return Err(self.invalid("stop recording"));
        }
        self.state = JobState::AwaitingJoin;
        Ok(())
    }

    /// Both streams are terminal. Recording is accepted as a source state
    /// because both recorders may end on their own before any stop.
    pub fn begin_composing(&mut self) -> Result<(), InvalidStateTransition> {
        if !matches!(self.state, JobState::Recording | JobState::AwaitingJoin) {
            return Err(self.invalid("begin composing"));
        }
        self.state = JobState::Composing;
        Ok(())
    }

    /// Transition from COMPOSING to SUCCEEDED
    pub fn succeed(&mut self, output: PathBuf) -> Result<(), InvalidStateTransition> {
        if self.state != JobState::Composing {
            return Err(self.invalid("complete composition"));
        }
        self.state = JobState::Succeeded(output);
        Ok(())
    }

    /// Any in-progress state may fail
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), InvalidStateTransition> {
        if !self.state.is_in_progress() {
            return Err(self.invalid("fail job"));
        }
        self.state = JobState::Failed(reason.into());
        Ok(())
    }
}
