//! Capture infrastructure module
//!
//! Provides dual-stream camera capture through ffmpeg.

mod ffmpeg;

pub use ffmpeg::{CaptureDevices, FfmpegCaptureSession};
