//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod composition;
pub mod config;
pub mod error;
pub mod geometry;
pub mod job;
pub mod recording;

// Re-export common types
pub use composition::{Canvas, CompositionTimeline, MediaInfo, Segment};
pub use config::AppConfig;
pub use error::*;
pub use geometry::{AffineTransform, Rect, Size};
pub use job::{JobState, RecordingJob};
pub use recording::{Duration, RecorderEvent, StreamId};
