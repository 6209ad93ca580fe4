//! Capture session port interface

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::domain::recording::{RecorderEvent, StreamId};

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum RecordingError {
    #[error("ffmpeg not found. Please install ffmpeg.")]
    FfmpegNotFound,

    #[error("Capture session is not running")]
    SessionNotRunning,

    #[error("Failed to start {stream} recording: {message}")]
    StartFailed { stream: StreamId, message: String },

    #[error("Failed to stop {stream} recording: {message}")]
    StopFailed { stream: StreamId, message: String },

    #[error("{stream} is already recording")]
    AlreadyRecording { stream: StreamId },
}

/// Port for the live camera/microphone session.
///
/// Each stream reports exactly one terminal [`RecorderEvent`] per
/// successful `start_recording`, on the channel passed in, from whatever
/// task observes the recorder finishing.
#[async_trait]
pub trait CaptureSession: Send + Sync {
    /// Acquire devices and make the session ready to record
    async fn start_session(&self) -> Result<(), RecordingError>;

    /// Stop any active recordings and release the session
    async fn stop_session(&self) -> Result<(), RecordingError>;

    fn is_running(&self) -> bool;

    /// Begin writing `stream` to `path`
    async fn start_recording(
        &self,
        stream: StreamId,
        path: &Path,
        events: UnboundedSender<RecorderEvent>,
    ) -> Result<(), RecordingError>;

    /// Ask `stream` to finish its file. Completion is reported through the
    /// event channel, not by this call returning.
    async fn stop_recording(&self, stream: StreamId) -> Result<(), RecordingError>;
}

/// Blanket implementation for shared capture sessions
#[async_trait]
impl<T: CaptureSession + ?Sized> CaptureSession for Arc<T> {
    async fn start_session(&self) -> Result<(), RecordingError> {
        self.as_ref().start_session().await
    }

    async fn stop_session(&self) -> Result<(), RecordingError> {
        self.as_ref().stop_session().await
    }

    fn is_running(&self) -> bool {
        self.as_ref().is_running()
    }

    async fn start_recording(
        &self,
        stream: StreamId,
        path: &Path,
        events: UnboundedSender<RecorderEvent>,
    ) -> Result<(), RecordingError> {
        self.as_ref().start_recording(stream, path, events).await
    }

    async fn stop_recording(&self, stream: StreamId) -> Result<(), RecordingError> {
        self.as_ref().stop_recording(stream).await
    }
}
