//! Composition engine
//!
//! Turns two finished recordings into one split-screen video: probe both
//! sources, trim to the shared duration, place each into its canvas segment
//! and export.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::composition::{
    AudioLayer, Canvas, CompositionTimeline, MediaInfo, Segment, VideoLayer, DRAW_ORDER,
    PRIMARY_AUDIO_STREAM,
};
use crate::domain::geometry::{oriented_crop_rect, placement_transform, AffineTransform};
use crate::domain::recording::{Duration, StreamId};

use super::ports::{
    ExportStatus, Exporter, MediaError, MediaProbe, Storage, StorageError,
};

/// Errors from the composition engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("Video track not found: {0}")]
    TracksNotFound(String),

    #[error("Failed to load asset properties: {0}")]
    AssetPropertyLoadFailed(String),

    #[error("Failed to build composition tracks: {0}")]
    CompositionTrackError(String),

    #[error("Failed to create export session: {0}")]
    ExportSessionCreationFailed(String),

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("{0}")]
    GenericError(String),
}

impl From<StorageError> for CompositionError {
    fn from(e: StorageError) -> Self {
        Self::GenericError(e.to_string())
    }
}

/// Configuration for the composition engine
#[derive(Debug, Clone)]
pub struct CompositionConfig {
    /// Output file extension
    pub container: String,
    /// Mirror the front stream, as selfie cameras do
    pub mirror_front: bool,
    /// An export still running after this long fails
    pub export_timeout: Duration,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            container: "mp4".to_string(),
            mirror_front: true,
            export_timeout: Duration::default_export_timeout(),
        }
    }
}

/// Composition engine use case
pub struct CompositionEngine<P, E, S>
where
    P: MediaProbe,
    E: Exporter,
    S: Storage,
{
    probe: P,
    exporter: E,
    storage: S,
    config: CompositionConfig,
}

impl<P, E, S> CompositionEngine<P, E, S>
where
    P: MediaProbe,
    E: Exporter,
    S: Storage,
{
    pub fn new(probe: P, exporter: E, storage: S, config: CompositionConfig) -> Self {
        Self {
            probe,
            exporter,
            storage,
            config,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Probe both sources and lay them out on a timeline
    pub async fn build_timeline(
        &self,
        front: &Path,
        back: &Path,
        canvas: &Canvas,
    ) -> Result<CompositionTimeline, CompositionError> {
        let (front_info, back_info) = tokio::join!(self.probe.probe(front), self.probe.probe(back));
        let front_info = front_info.map_err(|e| probe_error(StreamId::Front, e))?;
        let back_info = back_info.map_err(|e| probe_error(StreamId::Back, e))?;

        debug!(
            front_size = %front_info.natural_size,
            front_duration = ?front_info.duration,
            back_size = %back_info.natural_size,
            back_duration = ?back_info.duration,
            "Probed sources"
        );

        self.assemble(canvas, &front_info, &back_info)
    }

    fn assemble(
        &self,
        canvas: &Canvas,
        front: &MediaInfo,
        back: &MediaInfo,
    ) -> Result<CompositionTimeline, CompositionError> {
        let shared = front.duration.min(back.duration);
        if shared.is_zero() {
            return Err(CompositionError::CompositionTrackError(
                "sources share no playable duration".to_string(),
            ));
        }

        let info_for = |stream: StreamId| match stream {
            StreamId::Front => front,
            StreamId::Back => back,
        };

        let mut timeline = CompositionTimeline::new(*canvas, shared);
        for stream in DRAW_ORDER {
            let info = info_for(stream);
            let layer = self.video_layer(stream, info, canvas);
            timeline
                .insert_video_track(layer, info.duration)
                .map_err(|e| CompositionError::CompositionTrackError(e.to_string()))?;
        }

        let primary = info_for(PRIMARY_AUDIO_STREAM);
        if primary.has_audio {
            let audio = AudioLayer {
                stream: PRIMARY_AUDIO_STREAM,
                source: primary.path.clone(),
            };
            timeline
                .insert_audio_track(audio, primary.duration)
                .map_err(|e| CompositionError::CompositionTrackError(e.to_string()))?;
        } else {
            info!(stream = %PRIMARY_AUDIO_STREAM, "No audio track, composing video only");
        }

        Ok(timeline)
    }

    fn video_layer(&self, stream: StreamId, info: &MediaInfo, canvas: &Canvas) -> VideoLayer {
        let segment = Segment::for_stream(stream);
        let target = canvas.segment_size();
        let orientation = if stream == StreamId::Front && self.config.mirror_front {
            info.orientation.then(&AffineTransform::mirror_horizontal())
        } else {
            info.orientation
        };

        let crop = oriented_crop_rect(info.natural_size, &orientation, target);
        let transform = placement_transform(
            info.natural_size,
            &orientation,
            crop,
            target,
            canvas.size(),
            segment.destination_offset(canvas),
        );

        VideoLayer {
            stream,
            source: info.path.clone(),
            segment,
            natural_size: info.natural_size,
            orientation,
            crop,
            target,
            transform,
        }
    }

    /// Compose two recordings into a new file in the storage directory
    pub async fn compose(
        &self,
        front: &Path,
        back: &Path,
        canvas: &Canvas,
    ) -> Result<PathBuf, CompositionError> {
        let timeline = self.build_timeline(front, back, canvas).await?;

        let directory = self.storage.resolve_output_directory().await?;
        let output = directory.join(format!(
            "stitched_{}.{}",
            Uuid::new_v4(),
            self.config.container
        ));
        if self.storage.remove_if_exists(&output).await? {
            debug!(path = %output.display(), "Removed existing file at output path");
        }

        info!(
            output = %output.display(),
            duration = ?timeline.duration(),
            canvas = %canvas,
            "Exporting composition"
        );

        let limit = self.config.export_timeout;
        let status =
            match tokio::time::timeout(limit.as_std(), self.exporter.export(&timeline, &output)).await {
                Err(_) => {
                    warn!(limit = %limit, "Export timed out");
                    self.discard_partial(&output).await;
                    return Err(CompositionError::ExportFailed(format!(
                        "export timed out after {}",
                        limit
                    )));
                }
                Ok(Err(e)) => return Err(CompositionError::ExportSessionCreationFailed(e.to_string())),
                Ok(Ok(status)) => status,
            };

        let failure = match status {
            ExportStatus::Completed => {
                info!(output = %output.display(), "Export completed");
                return Ok(output);
            }
            ExportStatus::Failed(reason) => reason,
            ExportStatus::Cancelled => "export cancelled".to_string(),
            ExportStatus::Unknown(status) => format!("unexpected export status: {}", status),
        };

        warn!(reason = %failure, "Export did not complete");
        self.discard_partial(&output).await;
        Err(CompositionError::ExportFailed(failure))
    }

    async fn discard_partial(&self, output: &Path) {
        if let Err(e) = self.storage.remove_if_exists(output).await {
            warn!(error = %e, "Failed to remove partial export");
        }
    }
}

fn probe_error(stream: StreamId, error: MediaError) -> CompositionError {
    let message = format!("{} source: {}", stream, error);
    match error {
        MediaError::NotFound(_) | MediaError::NoVideoTrack(_) => {
            CompositionError::TracksNotFound(message)
        }
        MediaError::ProbeNotFound
        | MediaError::ProbeFailed(_)
        | MediaError::InvalidMetadata(_) => CompositionError::AssetPropertyLoadFailed(message),
    }
}
