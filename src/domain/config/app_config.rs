//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::composition::Canvas;
use crate::domain::composition::canvas::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_FRAME_RATE};
use crate::domain::recording::Duration;

/// Video containers the pipeline writes and lists
pub const VIDEO_CONTAINERS: [&str; 2] = ["mp4", "mov"];

pub const DEFAULT_CONTAINER: &str = "mp4";

#[cfg(target_os = "macos")]
mod platform {
    pub const INPUT_FORMAT: &str = "avfoundation";
    pub const FRONT_DEVICE: &str = "0";
    pub const BACK_DEVICE: &str = "1";
    pub const AUDIO_FORMAT: &str = "avfoundation";
    pub const AUDIO_DEVICE: &str = ":0";
}

#[cfg(not(target_os = "macos"))]
mod platform {
    pub const INPUT_FORMAT: &str = "v4l2";
    pub const FRONT_DEVICE: &str = "/dev/video0";
    pub const BACK_DEVICE: &str = "/dev/video1";
    pub const AUDIO_FORMAT: &str = "pulse";
    pub const AUDIO_DEVICE: &str = "default";
}

/// Capture device configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub input_format: Option<String>,
    pub front_device: Option<String>,
    pub back_device: Option<String>,
    pub audio_format: Option<String>,
    pub audio_device: Option<String>,
    pub mirror_front: Option<bool>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub output_dir: Option<String>,
    pub scratch_dir: Option<String>,
    pub max_duration: Option<String>,
    pub export_timeout: Option<String>,
    pub canvas_width: Option<u32>,
    pub canvas_height: Option<u32>,
    pub frame_rate: Option<u32>,
    pub container: Option<String>,
    pub notify: Option<bool>,
    pub keep_sources: Option<bool>,
    pub capture: Option<CaptureConfig>,
}

impl AppConfig {
    /// Create config with default values.
    /// Directories stay unset: their defaults depend on the platform's
    /// user directories and are resolved by the storage adapter.
    pub fn defaults() -> Self {
        Self {
            output_dir: None,
            scratch_dir: None,
            max_duration: Some(Duration::default_max_duration().to_string()),
            export_timeout: Some(Duration::default_export_timeout().to_string()),
            canvas_width: Some(DEFAULT_CANVAS_WIDTH),
            canvas_height: Some(DEFAULT_CANVAS_HEIGHT),
            frame_rate: Some(DEFAULT_FRAME_RATE),
            container: Some(DEFAULT_CONTAINER.to_string()),
            notify: Some(false),
            keep_sources: Some(false),
            capture: Some(CaptureConfig {
                input_format: Some(platform::INPUT_FORMAT.to_string()),
                front_device: Some(platform::FRONT_DEVICE.to_string()),
                back_device: Some(platform::BACK_DEVICE.to_string()),
                audio_format: Some(platform::AUDIO_FORMAT.to_string()),
                audio_device: Some(platform::AUDIO_DEVICE.to_string()),
                mirror_front: Some(true),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            output_dir: other.output_dir.or(self.output_dir),
            scratch_dir: other.scratch_dir.or(self.scratch_dir),
            max_duration: other.max_duration.or(self.max_duration),
            export_timeout: other.export_timeout.or(self.export_timeout),
            canvas_width: other.canvas_width.or(self.canvas_width),
            canvas_height: other.canvas_height.or(self.canvas_height),
            frame_rate: other.frame_rate.or(self.frame_rate),
            container: other.container.or(self.container),
            notify: other.notify.or(self.notify),
            keep_sources: other.keep_sources.or(self.keep_sources),
            capture: Self::merge_capture_config(self.capture, other.capture),
        }
    }

    fn merge_capture_config(
        base: Option<CaptureConfig>,
        other: Option<CaptureConfig>,
    ) -> Option<CaptureConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(CaptureConfig {
                input_format: o.input_format.or(b.input_format),
                front_device: o.front_device.or(b.front_device),
                back_device: o.back_device.or(b.back_device),
                audio_format: o.audio_format.or(b.audio_format),
                audio_device: o.audio_device.or(b.audio_device),
                mirror_front: o.mirror_front.or(b.mirror_front),
            }),
        }
    }

    /// Get max_duration as parsed Duration, or default if not set/invalid
    pub fn max_duration_or_default(&self) -> Duration {
        self.max_duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_max_duration)
    }

    /// Get export_timeout as parsed Duration, or default if not set/invalid
    pub fn export_timeout_or_default(&self) -> Duration {
        self.export_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_export_timeout)
    }

    /// Canvas from the size and frame rate keys.
    /// An invalid combination falls back to the default canvas.
    pub fn canvas_or_default(&self) -> Canvas {
        Canvas::new(
            self.canvas_width.unwrap_or(DEFAULT_CANVAS_WIDTH),
            self.canvas_height.unwrap_or(DEFAULT_CANVAS_HEIGHT),
            self.frame_rate.unwrap_or(DEFAULT_FRAME_RATE),
        )
        .unwrap_or_default()
    }

    /// Output container extension, or "mp4" if not set/unknown
    pub fn container_or_default(&self) -> &str {
        self.container
            .as_deref()
            .filter(|c| VIDEO_CONTAINERS.contains(c))
            .unwrap_or(DEFAULT_CONTAINER)
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    /// Get keep_sources setting, or false if not set
    pub fn keep_sources_or_default(&self) -> bool {
        self.keep_sources.unwrap_or(false)
    }

    pub fn input_format_or_default(&self) -> &str {
        self.capture
            .as_ref()
            .and_then(|c| c.input_format.as_deref())
            .unwrap_or(platform::INPUT_FORMAT)
    }

    pub fn front_device_or_default(&self) -> &str {
        self.capture
            .as_ref()
            .and_then(|c| c.front_device.as_deref())
            .unwrap_or(platform::FRONT_DEVICE)
    }

    pub fn back_device_or_default(&self) -> &str {
        self.capture
            .as_ref()
            .and_then(|c| c.back_device.as_deref())
            .unwrap_or(platform::BACK_DEVICE)
    }

    pub fn audio_format_or_default(&self) -> &str {
        self.capture
            .as_ref()
            .and_then(|c| c.audio_format.as_deref())
            .unwrap_or(platform::AUDIO_FORMAT)
    }

    pub fn audio_device_or_default(&self) -> &str {
        self.capture
            .as_ref()
            .and_then(|c| c.audio_device.as_deref())
            .unwrap_or(platform::AUDIO_DEVICE)
    }

    /// Get mirror_front setting, or true if not set
    pub fn mirror_front_or_default(&self) -> bool {
        self.capture
            .as_ref()
            .and_then(|c| c.mirror_front)
            .unwrap_or(true)
    }
}
