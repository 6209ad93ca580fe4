//! Multi-track composition timeline
//!
//! A timeline holds at most two video layers and one audio layer, all
//! sharing one time range that starts at zero.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::canvas::{Canvas, Segment};
use crate::domain::geometry::{AffineTransform, Rect, Size};
use crate::domain::recording::StreamId;

/// Maximum number of video layers in one timeline
pub const MAX_VIDEO_LAYERS: usize = 2;

/// Half-open time range `[start, start + duration)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Duration,
    pub duration: Duration,
}

impl TimeRange {
    pub const fn from_zero(duration: Duration) -> Self {
        Self {
            start: Duration::ZERO,
            duration,
        }
    }

    pub fn end(&self) -> Duration {
        self.start + self.duration
    }

    pub fn is_empty(&self) -> bool {
        self.duration.is_zero()
    }
}

/// Error when a track cannot be placed on the timeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackInsertError {
    #[error("Cannot insert an empty time range")]
    EmptyRange,

    #[error("Time range ends at {requested:?} but the {stream} source only lasts {available:?}")]
    BeyondSource {
        stream: StreamId,
        requested: Duration,
        available: Duration,
    },

    #[error("Timeline already holds two video tracks")]
    TooManyVideoTracks,

    #[error("Timeline already holds an audio track")]
    AudioAlreadyPresent,
}

/// One source drawn into its canvas segment for the whole time range
#[derive(Debug, Clone, PartialEq)]
pub struct VideoLayer {
    pub stream: StreamId,
    pub source: PathBuf,
    pub segment: Segment,
    pub natural_size: Size,
    /// Orientation as used for placement (mirroring policy already applied)
    pub orientation: AffineTransform,
    pub crop: Rect,
    pub target: Size,
    pub transform: AffineTransform,
}

impl VideoLayer {
    /// Canvas region covered by the placed crop, bottom-left origin
    pub fn placed_bounds(&self) -> Rect {
        self.transform.bounding_box(&self.crop)
    }
}

/// The single retained audio track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioLayer {
    pub stream: StreamId,
    pub source: PathBuf,
}

/// Timeline with one shared time range.
/// Video layers are kept in insertion order, which is the draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionTimeline {
    canvas: Canvas,
    time_range: TimeRange,
    video_layers: Vec<VideoLayer>,
    audio: Option<AudioLayer>,
}

impl CompositionTimeline {
    pub fn new(canvas: Canvas, shared_duration: Duration) -> Self {
        Self {
            canvas,
            time_range: TimeRange::from_zero(shared_duration),
            video_layers: Vec::with_capacity(MAX_VIDEO_LAYERS),
            audio: None,
        }
    }

    fn check_range(&self, stream: StreamId, source_duration: Duration) -> Result<(), TrackInsertError> {
        if self.time_range.is_empty() {
            return Err(TrackInsertError::EmptyRange);
        }
        if self.time_range.end() > source_duration {
            return Err(TrackInsertError::BeyondSource {
                stream,
                requested: self.time_range.end(),
                available: source_duration,
            });
        }
        Ok(())
    }

    pub fn insert_video_track(
        &mut self,
        layer: VideoLayer,
        source_duration: Duration,
    ) -> Result<(), TrackInsertError> {
        self.check_range(layer.stream, source_duration)?;
        if self.video_layers.len() >= MAX_VIDEO_LAYERS {
            return Err(TrackInsertError::TooManyVideoTracks);
        }
        self.video_layers.push(layer);
        Ok(())
    }

    pub fn insert_audio_track(
        &mut self,
        audio: AudioLayer,
        source_duration: Duration,
    ) -> Result<(), TrackInsertError> {
        self.check_range(audio.stream, source_duration)?;
        if self.audio.is_some() {
            return Err(TrackInsertError::AudioAlreadyPresent);
        }
        self.audio = Some(audio);
        Ok(())
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn render_size(&self) -> Size {
        self.canvas.size()
    }

    pub fn frame_rate(&self) -> u32 {
        self.canvas.frame_rate()
    }

    pub fn duration(&self) -> Duration {
        self.time_range.duration
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    pub fn video_layers(&self) -> &[VideoLayer] {
        &self.video_layers
    }

    pub fn audio(&self) -> Option<&AudioLayer> {
        self.audio.as_ref()
    }

    /// Source files in input order: video layers first, then audio if its
    /// file is not already a video input
    pub fn input_files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = self.video_layers.iter().map(|l| l.source.as_path()).collect();
        if let Some(audio) = &self.audio {
            if !files.contains(&audio.source.as_path()) {
                files.push(audio.source.as_path());
            }
        }
        files
    }
}
