//! FFmpeg-based exporter
//!
//! Renders a [`CompositionTimeline`] with a single `ffmpeg` invocation: every
//! layer is trimmed, cropped, oriented and scaled into its segment, then
//! overlaid on a black canvas in draw order.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::application::ports::{ExportError, ExportStatus, Exporter};
use crate::domain::composition::{CompositionTimeline, VideoLayer};

/// Exporter running `ffmpeg`
pub struct FfmpegExporter {
    program: PathBuf,
}

impl FfmpegExporter {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
        }
    }
}

impl Default for FfmpegExporter {
    fn default() -> Self {
        Self::new()
    }
}

fn seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

/// Filter for the linear part of a layer orientation.
///
/// Only the eight exact quarter-turn and mirror combinations can be
/// expressed; anything else is rejected.
fn orientation_filter(layer: &VideoLayer) -> Result<Option<&'static str>, ExportError> {
    let o = layer.orientation.linear();
    let unsupported = || ExportError::UnsupportedOrientation {
        stream: layer.stream.to_string(),
        transform: format!("[{} {} {} {}]", o.a, o.b, o.c, o.d),
    };

    let coefficients = [o.a, o.b, o.c, o.d];
    if coefficients.iter().any(|v| (v - v.round()).abs() > 1e-6) {
        return Err(unsupported());
    }

    let filter = match coefficients.map(|v| v.round() as i8) {
        [1, 0, 0, 1] => None,
        [-1, 0, 0, 1] => Some("hflip"),
        [1, 0, 0, -1] => Some("vflip"),
        [-1, 0, 0, -1] => Some("hflip,vflip"),
        [0, 1, -1, 0] => Some("transpose=clock"),
        [0, -1, 1, 0] => Some("transpose=cclock"),
        [0, 1, 1, 0] => Some("transpose=cclock_flip"),
        [0, -1, -1, 0] => Some("transpose=clock_flip"),
        _ => return Err(unsupported()),
    };
    Ok(filter)
}

fn input_index(inputs: &[&Path], source: &Path) -> Result<usize, ExportError> {
    inputs.iter().position(|p| *p == source).ok_or_else(|| {
        ExportError::InvalidTimeline(format!("{} is not a timeline input", source.display()))
    })
}

/// Build the `-filter_complex` graph for a timeline.
///
/// Produces a `[vout]` video label and, when the timeline carries audio,
/// an `[aout]` audio label.
pub fn build_filter_graph(timeline: &CompositionTimeline) -> Result<String, ExportError> {
    let layers = timeline.video_layers();
    if layers.is_empty() {
        return Err(ExportError::InvalidTimeline("no video layers".to_string()));
    }

    let inputs = timeline.input_files();
    let canvas = timeline.canvas();
    let duration = seconds(timeline.duration());
    let mut chains = vec![format!(
        "color=c=black:s={}x{}:r={}:d={}[base]",
        canvas.width(),
        canvas.height(),
        canvas.frame_rate(),
        duration
    )];

    for (i, layer) in layers.iter().enumerate() {
        let input = input_index(&inputs, &layer.source)?;
        let crop = layer.crop;
        let mut chain = format!(
            "[{}:v]trim=duration={},setpts=PTS-STARTPTS,crop={}:{}:{}:{}",
            input,
            duration,
            crop.size.width.round() as i64,
            crop.size.height.round() as i64,
            crop.origin.x.round() as i64,
            crop.origin.y.round() as i64
        );
        if let Some(filter) = orientation_filter(layer)? {
            chain.push(',');
            chain.push_str(filter);
        }
        chain.push_str(&format!(
            ",scale={}:{},setsar=1[v{}]",
            layer.target.width.round() as i64,
            layer.target.height.round() as i64,
            i
        ));
        chains.push(chain);
    }

    // Placement uses a bottom-left origin, ffmpeg a top-left one
    let mut below = "base".to_string();
    for (i, layer) in layers.iter().enumerate() {
        let bounds = layer.placed_bounds();
        let x = bounds.min_x().round() as i64;
        let y = (f64::from(canvas.height()) - bounds.max_y()).round() as i64;
        let out = if i + 1 == layers.len() {
            "vout".to_string()
        } else {
            format!("stage{}", i)
        };
        let format = if out == "vout" { ",format=yuv420p" } else { "" };
        chains.push(format!(
            "[{}][v{}]overlay=x={}:y={}:eof_action=pass{}[{}]",
            below, i, x, y, format, out
        ));
        below = out;
    }

    if let Some(audio) = timeline.audio() {
        let input = input_index(&inputs, &audio.source)?;
        chains.push(format!(
            "[{}:a]atrim=duration={},asetpts=PTS-STARTPTS[aout]",
            input, duration
        ));
    }

    Ok(chains.join(";"))
}

/// Full `ffmpeg` argument list for exporting `timeline` to `output`
pub fn build_args(timeline: &CompositionTimeline, output: &Path) -> Result<Vec<String>, ExportError> {
    let graph = build_filter_graph(timeline)?;

    let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    for input in timeline.input_files() {
        // Orientation is applied by the graph, not by the decoder
        args.push("-noautorotate".to_string());
        args.push("-i".to_string());
        args.push(input.display().to_string());
    }

    args.extend(["-filter_complex".to_string(), graph]);
    args.extend(["-map".to_string(), "[vout]".to_string()]);
    if timeline.audio().is_some() {
        args.extend(["-map".to_string(), "[aout]".to_string()]);
        args.extend(["-c:a".to_string(), "aac".to_string()]);
    }

    args.extend(
        [
            "-c:v",
            "libx264",
            "-preset",
            "veryfast",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.extend(["-r".to_string(), timeline.frame_rate().to_string()]);
    args.extend(["-t".to_string(), seconds(timeline.duration())]);
    args.push(output.display().to_string());

    Ok(args)
}

#[cfg(unix)]
fn terminated_by_signal(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal().is_some()
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: &ExitStatus) -> bool {
    false
}

/// Map a finished ffmpeg process onto an export status
fn export_status(status: &ExitStatus, stderr: &str, output_exists: bool) -> ExportStatus {
    if terminated_by_signal(status) {
        return ExportStatus::Cancelled;
    }
    if !status.success() {
        let reason = stderr
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .unwrap_or("ffmpeg exited with an error");
        return ExportStatus::Failed(reason.to_string());
    }
    if !output_exists {
        return ExportStatus::Unknown("ffmpeg finished without writing output".to_string());
    }
    ExportStatus::Completed
}

#[async_trait]
impl Exporter for FfmpegExporter {
    async fn export(
        &self,
        timeline: &CompositionTimeline,
        output: &Path,
    ) -> Result<ExportStatus, ExportError> {
        let args = build_args(timeline, output)?;
        debug!(args = ?args, "Starting ffmpeg export");

        // kill_on_drop ends the encoder when a timeout drops this future
        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExportError::FfmpegNotFound
                } else {
                    ExportError::SpawnFailed(e.to_string())
                }
            })?;

        let exists = tokio::fs::try_exists(output).await.unwrap_or(false);
        let stderr = String::from_utf8_lossy(&result.stderr);
        Ok(export_status(&result.status, &stderr, exists))
    }
}
