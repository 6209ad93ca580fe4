//! FFmpeg-based capture session adapter
//!
//! Records each stream with its own `ffmpeg` process. Only the front stream
//! also captures the audio device.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{oneshot, Mutex};
use tokio::time::{timeout, Duration as TokioDuration};
use tracing::{debug, info, warn};

use crate::application::ports::{CaptureSession, RecordingError};
use crate::domain::config::AppConfig;
use crate::domain::recording::{RecorderEvent, StreamId};

/// Time ffmpeg gets to finalize a file after SIGINT before it is killed
const STOP_GRACE: TokioDuration = TokioDuration::from_secs(5);

/// Input devices for both streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDevices {
    pub input_format: String,
    pub front_device: String,
    pub back_device: String,
    pub audio_format: String,
    pub audio_device: String,
}

impl CaptureDevices {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            input_format: config.input_format_or_default().to_string(),
            front_device: config.front_device_or_default().to_string(),
            back_device: config.back_device_or_default().to_string(),
            audio_format: config.audio_format_or_default().to_string(),
            audio_device: config.audio_device_or_default().to_string(),
        }
    }

    fn video_device(&self, stream: StreamId) -> &str {
        match stream {
            StreamId::Front => &self.front_device,
            StreamId::Back => &self.back_device,
        }
    }
}

impl Default for CaptureDevices {
    fn default() -> Self {
        Self::from_config(&AppConfig::empty())
    }
}

struct ActiveRecorder {
    stop_tx: oneshot::Sender<()>,
}

/// Capture session driving one ffmpeg process per stream
pub struct FfmpegCaptureSession {
    devices: CaptureDevices,
    running: AtomicBool,
    recorders: Mutex<HashMap<StreamId, ActiveRecorder>>,
}

impl FfmpegCaptureSession {
    pub fn new(devices: CaptureDevices) -> Self {
        Self {
            devices,
            running: AtomicBool::new(false),
            recorders: Mutex::new(HashMap::new()),
        }
    }

    pub fn devices(&self) -> &CaptureDevices {
        &self.devices
    }

    /// Build FFmpeg args for recording one stream
    fn build_ffmpeg_args(devices: &CaptureDevices, stream: StreamId, output: &Path) -> Vec<String> {
        let with_audio = stream == StreamId::Front;

        let mut args: Vec<String> = [
            "-hide_banner",
            "-nostdin",
            "-loglevel",
            "error",
            "-y",
            "-f",
            devices.input_format.as_str(),
            "-i",
            devices.video_device(stream),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if with_audio {
            args.extend([
                "-f".to_string(),
                devices.audio_format.clone(),
                "-i".to_string(),
                devices.audio_device.clone(),
            ]);
        }

        args.extend(["-map".to_string(), "0:v:0".to_string()]);
        if with_audio {
            args.extend(["-map".to_string(), "1:a:0".to_string()]);
        }

        // Fast encode: the file is re-encoded during composition anyway
        args.extend([
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "ultrafast".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]);
        if with_audio {
            args.extend(["-c:a".to_string(), "aac".to_string()]);
        }

        args.push(output.to_string_lossy().to_string());
        args
    }

    fn spawn_ffmpeg(args: &[String], stream: StreamId) -> Result<Child, RecordingError> {
        let mut command = Command::new("ffmpeg");
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group: a terminal Ctrl-C reaches us, not the recorders
        #[cfg(unix)]
        command.process_group(0);

        command
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RecordingError::FfmpegNotFound
                } else {
                    RecordingError::StartFailed {
                        stream,
                        message: e.to_string(),
                    }
                }
            })
    }

    /// Ask ffmpeg to finish the file: SIGINT where available, kill otherwise
    #[cfg(unix)]
    fn interrupt(child: &mut Child) {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        if let Some(id) = child.id() {
            if let Err(e) = signal::kill(Pid::from_raw(id as i32), Signal::SIGINT) {
                warn!(error = %e, "SIGINT failed, killing ffmpeg");
                let _ = child.start_kill();
            }
        }
    }

    #[cfg(not(unix))]
    fn interrupt(child: &mut Child) {
        let _ = child.start_kill();
    }

    /// Wait for the process and report the outcome as one terminal event
    async fn watch_recorder(
        mut child: Child,
        stream: StreamId,
        path: PathBuf,
        events: UnboundedSender<RecorderEvent>,
        mut stop_rx: oneshot::Receiver<()>,
    ) {
        let stderr = child.stderr.take();

        // A dropped sender means the session is going away: stop as well
        let exited = tokio::select! {
            status = child.wait() => Some(status),
            _ = &mut stop_rx => None,
        };

        let stop_requested = exited.is_none();
        let status = match exited {
            Some(status) => status,
            None => {
                Self::interrupt(&mut child);
                match timeout(STOP_GRACE, child.wait()).await {
                    Ok(status) => status,
                    Err(_) => {
                        warn!(%stream, "ffmpeg did not stop in time, killing it");
                        let _ = child.start_kill();
                        child.wait().await
                    }
                }
            }
        };

        let error = match status {
            Ok(status) => {
                let last_line = Self::last_stderr_line(stderr).await;
                Self::outcome(status, stop_requested, path.exists(), last_line)
            }
            Err(e) => Some(format!("Failed to wait for ffmpeg: {}", e)),
        };

        let event = match error {
            Some(message) => RecorderEvent::failed(stream, &path, message),
            None => RecorderEvent::finished(stream, &path),
        };
        debug!(%stream, error = ?event.error, "Recorder exited");
        if events.send(event).is_err() {
            debug!(%stream, "No listener for recorder completion");
        }
    }

    /// Error message for a finished process, or None when the file is usable.
    /// ffmpeg exits non-zero after SIGINT, so a requested stop only needs
    /// the file to exist.
    fn outcome(
        status: ExitStatus,
        stop_requested: bool,
        file_exists: bool,
        last_stderr_line: Option<String>,
    ) -> Option<String> {
        if !file_exists {
            return Some(last_stderr_line.unwrap_or_else(|| "ffmpeg wrote no output file".to_string()));
        }
        if status.success() || stop_requested {
            return None;
        }
        Some(format!(
            "ffmpeg exited with {}: {}",
            status,
            last_stderr_line.as_deref().unwrap_or("unknown error")
        ))
    }

    async fn last_stderr_line(stderr: Option<ChildStderr>) -> Option<String> {
        let mut stderr = stderr?;
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf)
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .map(|line| line.trim().to_string())
    }
}

impl Default for FfmpegCaptureSession {
    fn default() -> Self {
        Self::new(CaptureDevices::default())
    }
}

#[async_trait]
impl CaptureSession for FfmpegCaptureSession {
    async fn start_session(&self) -> Result<(), RecordingError> {
        let output = Command::new("ffmpeg")
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match output {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RecordingError::FfmpegNotFound)
            }
            Err(e) => {
                return Err(RecordingError::StartFailed {
                    stream: StreamId::Front,
                    message: e.to_string(),
                })
            }
        }

        self.running.store(true, Ordering::SeqCst);
        info!(format = %self.devices.input_format, "Capture session started");
        Ok(())
    }

    async fn stop_session(&self) -> Result<(), RecordingError> {
        let mut recorders = self.recorders.lock().await;
        for (stream, recorder) in recorders.drain() {
            debug!(%stream, "Stopping recorder with the session");
            let _ = recorder.stop_tx.send(());
        }
        self.running.store(false, Ordering::SeqCst);
        info!("Capture session stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn start_recording(
        &self,
        stream: StreamId,
        path: &Path,
        events: UnboundedSender<RecorderEvent>,
    ) -> Result<(), RecordingError> {
        if !self.is_running() {
            return Err(RecordingError::SessionNotRunning);
        }

        let mut recorders = self.recorders.lock().await;
        // The waiter drops its receiver when the process exits
        if recorders
            .get(&stream)
            .is_some_and(|recorder| !recorder.stop_tx.is_closed())
        {
            return Err(RecordingError::AlreadyRecording { stream });
        }

        let args = Self::build_ffmpeg_args(&self.devices, stream, path);
        debug!(%stream, args = ?args, "Spawning ffmpeg");
        let child = Self::spawn_ffmpeg(&args, stream)?;

        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(Self::watch_recorder(
            child,
            stream,
            path.to_path_buf(),
            events,
            stop_rx,
        ));
        recorders.insert(stream, ActiveRecorder { stop_tx });

        info!(%stream, path = %path.display(), "Recording started");
        Ok(())
    }

    async fn stop_recording(&self, stream: StreamId) -> Result<(), RecordingError> {
        let recorder = self.recorders.lock().await.remove(&stream);
        match recorder {
            Some(recorder) => {
                // Err means the process already exited and reported
                let _ = recorder.stop_tx.send(());
                debug!(%stream, "Stop requested");
            }
            None => debug!(%stream, "Stop requested for a stream that is not recording"),
        }
        Ok(())
    }
}
