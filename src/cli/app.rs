//! Command runners: record, compose and list

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration as StdDuration, Instant};

use tracing::warn;

use crate::application::ports::{
    CaptureSession, ConfigStore, Exporter, MediaProbe, NotificationIcon, Notifier, Storage,
};
use crate::application::{
    CaptureJobConfig, CompositionConfig, CompositionEngine, DualCaptureUseCase, JoinConfig,
};
use crate::domain::composition::Canvas;
use crate::domain::config::{AppConfig, VIDEO_CONTAINERS};
use crate::domain::job::JobState;
use crate::domain::recording::Duration;
use crate::infrastructure::{
    create_notifier, CaptureDevices, FfmpegCaptureSession, FfmpegExporter, FfprobeMediaProbe,
    LocalVideoStorage, XdgConfigStore,
};

use super::args::Cli;
use super::presenter::Presenter;
use super::signals::StopSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding the output directory
pub const OUTPUT_DIR_ENV: &str = "DUO_STITCH_OUTPUT_DIR";

type Engine = CompositionEngine<FfprobeMediaProbe, FfmpegExporter, LocalVideoStorage>;

/// Settings for one run, validated before any device is opened
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub max_duration: Duration,
    pub export_timeout: Duration,
    pub canvas: Canvas,
    pub container: String,
    pub output_dir: Option<PathBuf>,
    pub scratch_dir: PathBuf,
    pub notify: bool,
    pub keep_sources: bool,
    pub mirror_front: bool,
    pub devices: CaptureDevices,
}

impl RunSettings {
    /// Resolve settings from a merged config.
    /// Unlike the `*_or_default` accessors, invalid values are errors here.
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        let max_duration = parse_duration(
            "max duration",
            config.max_duration.as_deref(),
            Duration::default_max_duration(),
        )?;
        let export_timeout = parse_duration(
            "export timeout",
            config.export_timeout.as_deref(),
            Duration::default_export_timeout(),
        )?;

        let defaults = Canvas::default();
        let canvas = Canvas::new(
            config.canvas_width.unwrap_or(defaults.width()),
            config.canvas_height.unwrap_or(defaults.height()),
            config.frame_rate.unwrap_or(defaults.frame_rate()),
        )
        .map_err(|e| e.to_string())?;

        if let Some(container) = config.container.as_deref() {
            if !VIDEO_CONTAINERS.contains(&container) {
                return Err(format!(
                    "Invalid container '{}'. Valid options: {}",
                    container,
                    VIDEO_CONTAINERS.join(", ")
                ));
            }
        }

        Ok(Self {
            max_duration,
            export_timeout,
            canvas,
            container: config.container_or_default().to_string(),
            output_dir: config.output_dir.as_ref().map(PathBuf::from),
            scratch_dir: config
                .scratch_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(default_scratch_dir),
            notify: config.notify_or_default(),
            keep_sources: config.keep_sources_or_default(),
            mirror_front: config.mirror_front_or_default(),
            devices: CaptureDevices::from_config(config),
        })
    }

    fn storage(&self) -> LocalVideoStorage {
        match &self.output_dir {
            Some(dir) => LocalVideoStorage::with_root(dir),
            None => LocalVideoStorage::new(),
        }
    }

    fn engine(&self) -> Engine {
        CompositionEngine::new(
            FfprobeMediaProbe::new(),
            FfmpegExporter::new(),
            self.storage(),
            CompositionConfig {
                container: self.container.clone(),
                mirror_front: self.mirror_front,
                export_timeout: self.export_timeout,
            },
        )
    }

    fn join_config(&self) -> JoinConfig {
        JoinConfig {
            scratch_dir: self.scratch_dir.clone(),
            container: self.container.clone(),
            max_duration: self.max_duration,
        }
    }

    fn job_config(&self) -> CaptureJobConfig {
        CaptureJobConfig {
            canvas: self.canvas,
            enable_notify: self.notify,
            keep_sources: self.keep_sources,
        }
    }
}

fn parse_duration(name: &str, value: Option<&str>, default: Duration) -> Result<Duration, String> {
    match value {
        Some(s) => s
            .parse()
            .map_err(|e| format!("Invalid {}: {}", name, e)),
        None => Ok(default),
    }
}

fn default_scratch_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("duo-stitch")
        .join("recordings")
}

/// Config layer built from command-line flags
pub fn config_from_args(cli: &Cli) -> Result<AppConfig, String> {
    let (canvas_width, canvas_height) = match cli.canvas.as_deref() {
        Some(s) => {
            let canvas: Canvas = s.parse().map_err(|e| format!("{}", e))?;
            (Some(canvas.width()), Some(canvas.height()))
        }
        None => (None, None),
    };

    Ok(AppConfig {
        output_dir: cli
            .output_dir
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
        max_duration: cli.max_duration.clone(),
        canvas_width,
        canvas_height,
        frame_rate: cli.fps,
        notify: cli.notify.then_some(true),
        keep_sources: cli.keep_sources.then_some(true),
        ..Default::default()
    })
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|e| {
        warn!(error = %e, path = %store.path().display(), "Ignoring unreadable config file");
        AppConfig::empty()
    });

    let env_config = AppConfig {
        output_dir: env::var(OUTPUT_DIR_ENV).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Record both cameras, stitch them and print the output path
pub async fn run_record(settings: RunSettings) -> ExitCode {
    let mut presenter = Presenter::new();
    let stop = StopSignal::new();
    stop.setup();

    let use_case = DualCaptureUseCase::new(
        FfmpegCaptureSession::new(settings.devices.clone()),
        settings.join_config(),
        settings.engine(),
        create_notifier(settings.notify),
        settings.job_config(),
    );

    // Subscribe first so no state published by the job can be missed
    let mut states = use_case.subscribe();
    if let Err(e) = use_case.start_recording().await {
        presenter.error(&e.to_string());
        release(&use_case).await;
        return ExitCode::from(EXIT_ERROR);
    }

    let started = Instant::now();
    let total = settings.max_duration.as_std();
    let mut ticker = tokio::time::interval(StdDuration::from_millis(200));
    let mut recording = true;
    let mut stop_sent = false;
    presenter.start_spinner("Recording...");

    let outcome = loop {
        tokio::select! {
            _ = ticker.tick() => {
                if recording {
                    presenter.update_recording_progress(started.elapsed(), total);
                }
            }
            _ = stop.requested(), if !stop_sent => {
                stop_sent = true;
                if recording {
                    presenter.update_spinner("Stopping cameras...");
                }
                if let Err(e) = use_case.stop_recording().await {
                    warn!(error = %e, "Stop request failed");
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break JobState::Failed("job ended unexpectedly".to_string());
                }
                let state = states.borrow_and_update().clone();
                recording = state == JobState::Recording;
                match state {
                    JobState::AwaitingJoin => presenter.update_spinner("Finishing recordings..."),
                    JobState::Composing => {
                        presenter.update_spinner("Stitching split-screen video...")
                    }
                    s if s.is_terminal() => break s,
                    _ => {}
                }
            }
        }
    };

    release(&use_case).await;

    match outcome {
        JobState::Succeeded(path) => {
            presenter.spinner_success("Stitched video ready");
            presenter.output(&path.display().to_string());
            ExitCode::from(EXIT_SUCCESS)
        }
        other => {
            let reason = other.failure_reason().unwrap_or("job did not finish");
            presenter.spinner_fail(reason);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn release<C, P, E, S, N>(use_case: &DualCaptureUseCase<C, P, E, S, N>)
where
    C: CaptureSession + 'static,
    P: MediaProbe + 'static,
    E: Exporter + 'static,
    S: Storage + 'static,
    N: Notifier + 'static,
{
    if let Err(e) = use_case.shutdown().await {
        warn!(error = %e, "Failed to release the capture session");
    }
}

/// Stitch two existing recordings
pub async fn run_compose(settings: RunSettings, front: PathBuf, back: PathBuf) -> ExitCode {
    let mut presenter = Presenter::new();
    let engine = settings.engine();
    let notifier = create_notifier(settings.notify);

    presenter.start_spinner("Stitching split-screen video...");
    let result = engine.compose(&front, &back, &settings.canvas).await;

    let (message, icon) = match &result {
        Ok(path) => (format!("Saved {}", path.display()), NotificationIcon::Success),
        Err(e) => (format!("Composition failed: {}", e), NotificationIcon::Error),
    };
    if let Err(e) = notifier.notify("Duo Stitch", &message, icon).await {
        warn!(error = %e, "Failed to show notification");
    }

    match result {
        Ok(path) => {
            presenter.spinner_success("Stitched video ready");
            presenter.output(&path.display().to_string());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.spinner_fail(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Print every stitched video in the output directory
pub async fn run_list(settings: RunSettings) -> ExitCode {
    let presenter = Presenter::new();
    let storage = settings.storage();

    match storage.list_video_files().await {
        Ok(files) if files.is_empty() => {
            presenter.info(&format!("No videos in {}", storage.root().display()));
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(files) => {
            for file in files {
                presenter.output(&file.display().to_string());
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_resolve() {
        let settings = RunSettings::from_config(&AppConfig::defaults()).unwrap();
        assert_eq!(settings.max_duration, Duration::from_secs(12));
        assert_eq!(settings.export_timeout, Duration::from_secs(120));
        assert_eq!(settings.canvas, Canvas::default());
        assert_eq!(settings.container, "mp4");
        assert!(settings.mirror_front);
        assert!(!settings.keep_sources);
        assert!(settings.scratch_dir.ends_with("recordings"));
    }

    #[test]
    fn invalid_values_are_errors() {
        let bad_duration = AppConfig {
            max_duration: Some("forever".to_string()),
            ..AppConfig::defaults()
        };
        assert!(RunSettings::from_config(&bad_duration).is_err());

        let odd_canvas = AppConfig {
            canvas_width: Some(1081),
            ..AppConfig::defaults()
        };
        assert!(RunSettings::from_config(&odd_canvas).is_err());

        let bad_container = AppConfig {
            container: Some("avi".to_string()),
            ..AppConfig::defaults()
        };
        assert!(RunSettings::from_config(&bad_container).is_err());
    }

    #[test]
    fn args_become_config_layer() {
        let cli = Cli::parse_from([
            "duo-stitch", "-m", "5s", "-s", "720x1280", "--fps", "24", "-o", "/videos", "-n",
        ]);
        let config = config_from_args(&cli).unwrap();
        assert_eq!(config.max_duration.as_deref(), Some("5s"));
        assert_eq!(config.canvas_width, Some(720));
        assert_eq!(config.canvas_height, Some(1280));
        assert_eq!(config.frame_rate, Some(24));
        assert_eq!(config.output_dir.as_deref(), Some("/videos"));
        assert_eq!(config.notify, Some(true));
        assert_eq!(config.keep_sources, None);

        let settings = RunSettings::from_config(&AppConfig::defaults().merge(config)).unwrap();
        assert_eq!(settings.canvas, Canvas::new(720, 1280, 24).unwrap());
        assert_eq!(settings.output_dir, Some(PathBuf::from("/videos")));
    }

    #[test]
    fn malformed_canvas_arg_is_rejected() {
        let cli = Cli::parse_from(["duo-stitch", "--canvas", "wide"]);
        assert!(config_from_args(&cli).is_err());
    }
}
