//! ffprobe-based media probe adapter

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::application::ports::{MediaError, MediaProbe};
use crate::domain::composition::MediaInfo;
use crate::domain::geometry::{AffineTransform, Size};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    side_data_list: Vec<SideData>,
    #[serde(default)]
    disposition: HashMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct SideData {
    rotation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl ProbeStream {
    fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
            && self.disposition.get("attached_pic").copied().unwrap_or(0) == 0
    }

    fn is_audio(&self) -> bool {
        self.codec_type.as_deref() == Some("audio")
    }

    /// Clockwise rotation needed to display the frame upright.
    /// The display matrix reports counter-clockwise degrees, the legacy
    /// `rotate` tag clockwise ones.
    fn clockwise_rotation(&self) -> f64 {
        if let Some(ccw) = self.side_data_list.iter().find_map(|d| d.rotation) {
            return (-ccw).rem_euclid(360.0);
        }
        self.tags
            .get("rotate")
            .and_then(|r| r.trim().parse::<f64>().ok())
            .map(|cw| cw.rem_euclid(360.0))
            .unwrap_or(0.0)
    }
}

fn parse_seconds(value: Option<&str>) -> Option<Duration> {
    let secs: f64 = value?.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Build [`MediaInfo`] from `ffprobe -print_format json` output
pub fn parse_probe_output(path: &Path, json: &str) -> Result<MediaInfo, MediaError> {
    let output: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| MediaError::InvalidMetadata(format!("{}: {}", path.display(), e)))?;

    let video = output
        .streams
        .iter()
        .find(|s| s.is_video())
        .ok_or_else(|| MediaError::NoVideoTrack(path.to_path_buf()))?;

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(MediaError::NoVideoTrack(path.to_path_buf())),
    };

    let duration = parse_seconds(video.duration.as_deref())
        .or_else(|| parse_seconds(output.format.as_ref().and_then(|f| f.duration.as_deref())))
        .ok_or_else(|| {
            MediaError::InvalidMetadata(format!("{}: duration unavailable", path.display()))
        })?;

    Ok(MediaInfo {
        path: path.to_path_buf(),
        natural_size: Size::new(f64::from(width), f64::from(height)),
        orientation: AffineTransform::rotation_degrees(video.clockwise_rotation()),
        duration,
        has_audio: output.streams.iter().any(ProbeStream::is_audio),
    })
}

/// Media probe running `ffprobe`
pub struct FfprobeMediaProbe {
    program: PathBuf,
}

impl FfprobeMediaProbe {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffprobe"),
        }
    }
}

impl Default for FfprobeMediaProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaProbe for FfprobeMediaProbe {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, MediaError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(MediaError::NotFound(path.to_path_buf()));
        }

        let output = Command::new(&self.program)
            .args(["-v", "error", "-print_format", "json", "-show_streams", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::ProbeNotFound
                } else {
                    MediaError::ProbeFailed(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::ProbeFailed(format!(
                "{}: {}",
                path.display(),
                stderr.lines().last().unwrap_or("ffprobe failed")
            )));
        }

        let info = parse_probe_output(path, &String::from_utf8_lossy(&output.stdout))?;
        debug!(
            path = %path.display(),
            size = %info.natural_size,
            duration = ?info.duration,
            has_audio = info.has_audio,
            "Probed media"
        );
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORTRAIT_PHONE: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "duration": "10.010000",
                "side_data_list": [
                    { "side_data_type": "Display Matrix", "rotation": -90 }
                ],
                "disposition": { "default": 1, "attached_pic": 0 }
            },
            {
                "index": 1,
                "codec_type": "audio",
                "duration": "10.000000"
            }
        ],
        "format": { "duration": "10.024000" }
    }"#;

    fn path() -> &'static Path {
        Path::new("/tmp/clip.mp4")
    }

    #[test]
    fn parses_video_properties() {
        let info = parse_probe_output(path(), PORTRAIT_PHONE).unwrap();
        assert_eq!(info.natural_size, Size::new(1920.0, 1080.0));
        assert_eq!(info.duration, Duration::from_millis(10_010));
        assert!(info.has_audio);
        assert_eq!(info.orientation, AffineTransform::quarter_turns_clockwise(1));
    }

    #[test]
    fn legacy_rotate_tag_is_clockwise() {
        let json = r#"{
            "streams": [
                { "codec_type": "video", "width": 640, "height": 480,
                  "duration": "2.0", "tags": { "rotate": "270" } }
            ]
        }"#;
        let info = parse_probe_output(path(), json).unwrap();
        assert_eq!(info.orientation, AffineTransform::quarter_turns_clockwise(3));
        assert!(!info.has_audio);
    }

    #[test]
    fn falls_back_to_container_duration() {
        let json = r#"{
            "streams": [ { "codec_type": "video", "width": 640, "height": 480 } ],
            "format": { "duration": "3.5" }
        }"#;
        let info = parse_probe_output(path(), json).unwrap();
        assert_eq!(info.duration, Duration::from_millis(3500));
        assert!(info.orientation.is_identity());
    }

    #[test]
    fn audio_only_file_has_no_video_track() {
        let json = r#"{ "streams": [ { "codec_type": "audio", "duration": "1.0" } ] }"#;
        assert!(matches!(
            parse_probe_output(path(), json),
            Err(MediaError::NoVideoTrack(_))
        ));
    }

    #[test]
    fn cover_art_is_not_a_video_track() {
        let json = r#"{
            "streams": [
                { "codec_type": "video", "width": 300, "height": 300,
                  "disposition": { "attached_pic": 1 } }
            ],
            "format": { "duration": "1.0" }
        }"#;
        assert!(matches!(
            parse_probe_output(path(), json),
            Err(MediaError::NoVideoTrack(_))
        ));
    }

    #[test]
    fn missing_duration_is_invalid_metadata() {
        let json = r#"{ "streams": [ { "codec_type": "video", "width": 2, "height": 2 } ] }"#;
        assert!(matches!(
            parse_probe_output(path(), json),
            Err(MediaError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn garbage_is_invalid_metadata() {
        assert!(matches!(
            parse_probe_output(path(), "not json"),
            Err(MediaError::InvalidMetadata(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let probe = FfprobeMediaProbe::new();
        let err = probe
            .probe(Path::new("/definitely/not/here.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::NotFound(_)));
    }
}
