//! Recording job entity

pub mod state;

pub use state::{InvalidStateTransition, JobState, RecordingJob};
