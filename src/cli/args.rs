//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Duo Stitch - record two cameras at once and stitch them into one
/// split-screen video
#[derive(Parser, Debug)]
#[command(name = "duo-stitch")]
#[command(version)]
#[command(about = "Dual-camera capture that stitches front and back recordings into one split-screen video")]
#[command(long_about = None)]
pub struct Cli {
    /// Stop recording automatically after this long (e.g., 12s, 1m)
    #[arg(short = 'm', long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Output canvas size (e.g., 1080x1920)
    #[arg(short = 's', long, value_name = "WxH", global = true)]
    pub canvas: Option<String>,

    /// Output frame rate
    #[arg(long, value_name = "N", global = true)]
    pub fps: Option<u32>,

    /// Directory receiving stitched videos
    #[arg(short = 'o', long, value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Show desktop notifications
    #[arg(short = 'n', long, global = true)]
    pub notify: bool,

    /// Keep the raw per-camera recordings
    #[arg(long)]
    pub keep_sources: bool,

    /// Verbose diagnostics on stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stitch two existing recordings into one split-screen video
    Compose {
        /// Front camera recording (bottom half, provides the audio)
        front: PathBuf,
        /// Back camera recording (top half)
        back: PathBuf,
    },
    /// List stitched videos in the output directory
    List,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "output_dir",
    "scratch_dir",
    "max_duration",
    "export_timeout",
    "canvas_width",
    "canvas_height",
    "frame_rate",
    "container",
    "notify",
    "keep_sources",
    "capture.input_format",
    "capture.front_device",
    "capture.back_device",
    "capture.audio_format",
    "capture.audio_device",
    "capture.mirror_front",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["duo-stitch"]);
        assert!(cli.max_duration.is_none());
        assert!(cli.canvas.is_none());
        assert!(cli.fps.is_none());
        assert!(cli.output_dir.is_none());
        assert!(!cli.notify);
        assert!(!cli.keep_sources);
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parses_recording_flags() {
        let cli = Cli::parse_from([
            "duo-stitch", "-m", "30s", "-s", "720x1280", "--fps", "24", "-o", "/videos", "-n",
        ]);
        assert_eq!(cli.max_duration.as_deref(), Some("30s"));
        assert_eq!(cli.canvas.as_deref(), Some("720x1280"));
        assert_eq!(cli.fps, Some(24));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/videos")));
        assert!(cli.notify);
    }

    #[test]
    fn cli_parses_compose_with_global_flags() {
        let cli = Cli::parse_from(["duo-stitch", "compose", "f.mp4", "b.mp4", "--canvas", "720x1280"]);
        assert_eq!(cli.canvas.as_deref(), Some("720x1280"));
        match cli.command {
            Some(Commands::Compose { front, back }) => {
                assert_eq!(front, PathBuf::from("f.mp4"));
                assert_eq!(back, PathBuf::from("b.mp4"));
            }
            other => panic!("Expected compose, got {:?}", other),
        }
    }

    #[test]
    fn cli_parses_list() {
        let cli = Cli::parse_from(["duo-stitch", "list"]);
        assert!(matches!(cli.command, Some(Commands::List)));
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["duo-stitch", "config", "set", "frame_rate", "60"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "frame_rate");
            assert_eq!(value, "60");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("max_duration"));
        assert!(is_valid_config_key("capture.mirror_front"));
        assert!(!is_valid_config_key("api_key"));
        assert!(!is_valid_config_key("capture"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
