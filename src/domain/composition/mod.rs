//! Composition value objects: canvas, segments, timeline and source media

pub mod canvas;
pub mod media;
pub mod timeline;

pub use canvas::{Canvas, Segment, DRAW_ORDER, PRIMARY_AUDIO_STREAM};
pub use media::MediaInfo;
pub use timeline::{AudioLayer, CompositionTimeline, TimeRange, TrackInsertError, VideoLayer};
