//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod compose;
pub mod join;
pub mod ports;
pub mod stitch;

// Re-export use cases
pub use compose::{CompositionConfig, CompositionEngine, CompositionError};
pub use join::{
    JoinConfig, JoinError, JoinEvent, JoinPhase, JoinedRecording, RecordingJoinCoordinator,
};
pub use stitch::{CaptureJobConfig, CaptureUseCaseError, DualCaptureUseCase};
