//! Properties of a recorded asset

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::geometry::{AffineTransform, Size};

/// What the composition needs to know about one source file
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub path: PathBuf,
    /// Encoded pixel size, before orientation is applied
    pub natural_size: Size,
    /// Rotation/mirroring that makes the frame upright
    pub orientation: AffineTransform,
    pub duration: Duration,
    pub has_audio: bool,
}

impl MediaInfo {
    /// Upright size after applying the orientation
    pub fn display_size(&self) -> Size {
        self.orientation.effective_size(self.natural_size)
    }
}
