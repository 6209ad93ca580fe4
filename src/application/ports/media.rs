//! Media probing and export port interfaces

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::domain::composition::{CompositionTimeline, MediaInfo};

/// Probe errors
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    #[error("Media file not found: {0}")]
    NotFound(PathBuf),

    #[error("No decodable video track in {0}")]
    NoVideoTrack(PathBuf),

    #[error("ffprobe not found. Please install ffmpeg.")]
    ProbeNotFound,

    #[error("Failed to probe media: {0}")]
    ProbeFailed(String),

    #[error("Invalid media metadata: {0}")]
    InvalidMetadata(String),
}

/// Port for reading the properties of a recorded asset
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, MediaError>;
}

#[async_trait]
impl<T: MediaProbe + ?Sized> MediaProbe for Arc<T> {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, MediaError> {
        self.as_ref().probe(path).await
    }
}

/// How an export that ran to the end resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Completed,
    Failed(String),
    Cancelled,
    /// Any other outcome, carried verbatim
    Unknown(String),
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Unknown(status) => write!(f, "unknown: {}", status),
        }
    }
}

/// Errors creating an export session
#[derive(Debug, Clone, Error)]
pub enum ExportError {
    #[error("ffmpeg not found. Please install ffmpeg.")]
    FfmpegNotFound,

    #[error("Failed to launch export: {0}")]
    SpawnFailed(String),

    #[error("Unsupported orientation for the {stream} layer: {transform}")]
    UnsupportedOrientation { stream: String, transform: String },

    #[error("Timeline cannot be exported: {0}")]
    InvalidTimeline(String),
}

/// Port for encoding a timeline into a single output file
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Run the export to completion.
    ///
    /// `Err` means no export session could be created. Once one exists,
    /// every outcome is reported as an [`ExportStatus`].
    async fn export(
        &self,
        timeline: &CompositionTimeline,
        output: &Path,
    ) -> Result<ExportStatus, ExportError>;
}

#[async_trait]
impl<T: Exporter + ?Sized> Exporter for Arc<T> {
    async fn export(
        &self,
        timeline: &CompositionTimeline,
        output: &Path,
    ) -> Result<ExportStatus, ExportError> {
        self.as_ref().export(timeline, output).await
    }
}
