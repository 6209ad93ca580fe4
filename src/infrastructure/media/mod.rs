//! Media probing and export adapters

mod ffmpeg_export;
mod ffprobe;

pub use ffmpeg_export::{build_args, build_filter_graph, FfmpegExporter};
pub use ffprobe::{parse_probe_output, FfprobeMediaProbe};
