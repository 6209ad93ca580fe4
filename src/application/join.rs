//! Recording join coordinator
//!
//! Starts and stops both streams together and emits exactly one
//! [`JoinEvent::Joined`] per recording cycle, once both recorders have
//! reported a terminal event. Completion reports arrive over an mpsc
//! channel and are consumed by a single task. Every state change happens
//! inside one mutex-guarded critical section.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::recording::{Duration, RecorderEvent, StreamId};

use super::ports::{CaptureSession, RecordingError};

/// Coordinator phases for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPhase {
    #[default]
    Idle,
    Recording,
    AwaitingJoin,
    Joined,
}

impl JoinPhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::AwaitingJoin => "awaiting-join",
            Self::Joined => "joined",
        }
    }
}

impl fmt::Display for JoinPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors from the coordinator
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("Cannot start recording while {0}")]
    Busy(JoinPhase),

    #[error("Capture session failed: {0}")]
    Session(#[from] RecordingError),

    #[error("Failed to prepare scratch directory {path}: {message}")]
    ScratchDir { path: PathBuf, message: String },
}

/// Configuration for the coordinator
#[derive(Debug, Clone)]
pub struct JoinConfig {
    /// Directory receiving the raw per-stream recordings
    pub scratch_dir: PathBuf,
    /// Extension of the raw recordings
    pub container: String,
    /// Recording stops on its own after this long
    pub max_duration: Duration,
}

impl JoinConfig {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            container: "mp4".to_string(),
            max_duration: Duration::default_max_duration(),
        }
    }
}

/// Both streams of one cycle are terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRecording {
    pub cycle: u64,
    pub front: PathBuf,
    pub back: PathBuf,
    /// Streams that ended with an error, with the reported reason
    pub stream_errors: Vec<(StreamId, String)>,
}

impl JoinedRecording {
    pub fn path(&self, stream: StreamId) -> &Path {
        match stream {
            StreamId::Front => &self.front,
            StreamId::Back => &self.back,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.stream_errors.is_empty()
    }
}

/// Output of the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinEvent {
    /// The maximum duration elapsed and both streams were asked to stop
    AutoStopped { cycle: u64 },
    Joined(JoinedRecording),
}

#[derive(Debug)]
struct StreamSlot {
    path: PathBuf,
    finished: bool,
    error: Option<String>,
}

impl StreamSlot {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            finished: false,
            error: None,
        }
    }
}

#[derive(Debug, Default)]
struct JoinState {
    phase: JoinPhase,
    cycle: u64,
    front: Option<StreamSlot>,
    back: Option<StreamSlot>,
    /// Set before the join is emitted, cleared only by a new cycle
    join_dispatched: bool,
    auto_stop: Option<JoinHandle<()>>,
}

impl JoinState {
    fn slot(&self, stream: StreamId) -> Option<&StreamSlot> {
        match stream {
            StreamId::Front => self.front.as_ref(),
            StreamId::Back => self.back.as_ref(),
        }
    }

    fn slot_mut(&mut self, stream: StreamId) -> Option<&mut StreamSlot> {
        match stream {
            StreamId::Front => self.front.as_mut(),
            StreamId::Back => self.back.as_mut(),
        }
    }

    fn abort_auto_stop(&mut self) {
        if let Some(handle) = self.auto_stop.take() {
            handle.abort();
        }
    }
}

/// State shared with the consumer and timer tasks
struct Shared {
    state: Mutex<JoinState>,
    joined_tx: UnboundedSender<JoinEvent>,
}

impl Shared {
    /// Handle one recorder report. Runs only on the consumer task.
    async fn handle_event(&self, event: RecorderEvent) {
        let mut state = self.state.lock().await;
        let cycle = state.cycle;

        let Some(slot) = state
            .slot_mut(event.stream)
            .filter(|slot| slot.path == event.path)
        else {
            debug!(
                stream = %event.stream,
                path = %event.path.display(),
                "Ignoring report for a previous recording"
            );
            return;
        };

        if slot.finished {
            debug!(stream = %event.stream, cycle, "Ignoring duplicate completion report");
            return;
        }

        slot.finished = true;
        slot.error = event.error;
        match &slot.error {
            Some(error) => warn!(
                stream = %event.stream,
                cycle,
                %error,
                "Recording ended with an error, waiting for the other stream"
            ),
            None => info!(stream = %event.stream, cycle, "Recording finished"),
        }

        self.try_join(&mut state);
    }

    /// Emit the join if both streams are terminal and it has not fired yet
    fn try_join(&self, state: &mut JoinState) {
        if state.join_dispatched {
            return;
        }
        let (Some(front), Some(back)) = (state.front.as_ref(), state.back.as_ref()) else {
            return;
        };
        if !(front.finished && back.finished) {
            return;
        }

        state.join_dispatched = true;

        let stream_errors = StreamId::ALL
            .iter()
            .filter_map(|&stream| {
                state
                    .slot(stream)
                    .and_then(|slot| slot.error.clone())
                    .map(|error| (stream, error))
            })
            .collect();
        let joined = JoinedRecording {
            cycle: state.cycle,
            front: front.path.clone(),
            back: back.path.clone(),
            stream_errors,
        };

        state.phase = JoinPhase::Joined;
        state.abort_auto_stop();

        info!(cycle = joined.cycle, "Both streams finished, dispatching join");
        if self.joined_tx.send(JoinEvent::Joined(joined)).is_err() {
            warn!("Join receiver dropped, composition will not run");
        }
    }
}

/// Coordinates the two recorders of a capture session.
///
/// Must be created inside a tokio runtime: construction spawns the task
/// consuming recorder reports.
pub struct RecordingJoinCoordinator<C>
where
    C: CaptureSession + 'static,
{
    capture: Arc<C>,
    config: JoinConfig,
    shared: Arc<Shared>,
    recorder_tx: UnboundedSender<RecorderEvent>,
    consumer: JoinHandle<()>,
}

impl<C> RecordingJoinCoordinator<C>
where
    C: CaptureSession + 'static,
{
    /// Create a coordinator and the receiver of its join events
    pub fn new(capture: C, config: JoinConfig) -> (Self, UnboundedReceiver<JoinEvent>) {
        let (recorder_tx, mut recorder_rx) = mpsc::unbounded_channel::<RecorderEvent>();
        let (joined_tx, joined_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            state: Mutex::new(JoinState::default()),
            joined_tx,
        });

        let consumer_shared = Arc::clone(&shared);
        let consumer = tokio::spawn(async move {
            while let Some(event) = recorder_rx.recv().await {
                consumer_shared.handle_event(event).await;
            }
        });

        let coordinator = Self {
            capture: Arc::new(capture),
            config,
            shared,
            recorder_tx,
            consumer,
        };
        (coordinator, joined_rx)
    }

    pub async fn phase(&self) -> JoinPhase {
        self.shared.state.lock().await.phase
    }

    /// Number of the current (or last) cycle, starting at 1
    pub async fn cycle(&self) -> u64 {
        self.shared.state.lock().await.cycle
    }

    /// Output paths of the current cycle
    pub async fn current_paths(&self) -> Option<(PathBuf, PathBuf)> {
        let state = self.shared.state.lock().await;
        match (&state.front, &state.back) {
            (Some(front), Some(back)) => Some((front.path.clone(), back.path.clone())),
            _ => None,
        }
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    fn recording_path(&self, id: &Uuid, stream: StreamId) -> PathBuf {
        self.config
            .scratch_dir
            .join(format!("{}_{}.{}", id, stream, self.config.container))
    }

    /// Start a new cycle with fresh output paths for both streams.
    ///
    /// Accepted only when idle or after the previous cycle joined. A stream
    /// that fails to start is reported as finished with an error, so the
    /// join still fires once the other stream ends.
    pub async fn start_recording(&self) -> Result<u64, JoinError> {
        let mut state = self.shared.state.lock().await;
        if !matches!(state.phase, JoinPhase::Idle | JoinPhase::Joined) {
            return Err(JoinError::Busy(state.phase));
        }

        if !self.capture.is_running() {
            self.capture.start_session().await?;
        }

        tokio::fs::create_dir_all(&self.config.scratch_dir)
            .await
            .map_err(|e| JoinError::ScratchDir {
                path: self.config.scratch_dir.clone(),
                message: e.to_string(),
            })?;

        let id = Uuid::new_v4();
        let front_path = self.recording_path(&id, StreamId::Front);
        let back_path = self.recording_path(&id, StreamId::Back);

        state.cycle += 1;
        let cycle = state.cycle;
        state.front = Some(StreamSlot::new(front_path.clone()));
        state.back = Some(StreamSlot::new(back_path.clone()));
        state.join_dispatched = false;
        state.phase = JoinPhase::Recording;
        state.abort_auto_stop();

        info!(cycle, front = %front_path.display(), back = %back_path.display(), "Starting recording");

        let (front_result, back_result) = tokio::join!(
            self.capture
                .start_recording(StreamId::Front, &front_path, self.recorder_tx.clone()),
            self.capture
                .start_recording(StreamId::Back, &back_path, self.recorder_tx.clone()),
        );
        for (stream, path, result) in [
            (StreamId::Front, &front_path, front_result),
            (StreamId::Back, &back_path, back_result),
        ] {
            if let Err(e) = result {
                warn!(%stream, error = %e, "Stream failed to start");
                self.report_failure(stream, path, e.to_string());
            }
        }

        state.auto_stop = Some(self.spawn_auto_stop(cycle));
        Ok(cycle)
    }

    /// Ask both streams to stop.
    ///
    /// Idempotent: once stopping, later calls only re-run the join check.
    pub async fn stop_recording(&self) -> Result<(), JoinError> {
        let mut state = self.shared.state.lock().await;
        match state.phase {
            JoinPhase::Idle => {
                debug!("Stop requested with no recording");
            }
            JoinPhase::Recording => {
                state.abort_auto_stop();
                state.phase = JoinPhase::AwaitingJoin;
                info!(cycle = state.cycle, "Stopping recording");
                stop_unfinished(self.capture.as_ref(), &state, &self.recorder_tx).await;
                self.shared.try_join(&mut state);
            }
            JoinPhase::AwaitingJoin | JoinPhase::Joined => {
                self.shared.try_join(&mut state);
            }
        }
        Ok(())
    }

    /// Stop recording if needed and release the capture session
    pub async fn shutdown(&self) -> Result<(), JoinError> {
        self.stop_recording().await?;
        if self.capture.is_running() {
            self.capture.stop_session().await?;
        }
        Ok(())
    }

    fn report_failure(&self, stream: StreamId, path: &Path, error: String) {
        // The receiver lives as long as the consumer task
        let _ = self
            .recorder_tx
            .send(RecorderEvent::failed(stream, path, error));
    }

    fn spawn_auto_stop(&self, cycle: u64) -> JoinHandle<()> {
        let capture = Arc::clone(&self.capture);
        let shared = Arc::clone(&self.shared);
        let recorder_tx = self.recorder_tx.clone();
        let limit = self.config.max_duration;

        tokio::spawn(async move {
            tokio::time::sleep(limit.as_std()).await;

            let mut state = shared.state.lock().await;
            if state.cycle != cycle || state.phase != JoinPhase::Recording {
                return;
            }
            // Detach rather than abort: this is the timer's own handle
            state.auto_stop.take();
            state.phase = JoinPhase::AwaitingJoin;
            info!(cycle, limit = %limit, "Maximum duration reached, stopping");

            if shared
                .joined_tx
                .send(JoinEvent::AutoStopped { cycle })
                .is_err()
            {
                debug!("Join receiver dropped before auto-stop");
            }
            stop_unfinished(capture.as_ref(), &state, &recorder_tx).await;
        })
    }
}

impl<C> Drop for RecordingJoinCoordinator<C>
where
    C: CaptureSession + 'static,
{
    fn drop(&mut self) {
        self.consumer.abort();
        if let Ok(mut state) = self.shared.state.try_lock() {
            state.abort_auto_stop();
        }
    }
}

/// Stop every stream of the cycle that has not reported yet. A stream that
/// cannot be stopped is reported as finished with that error.
async fn stop_unfinished<C: CaptureSession + ?Sized>(
    capture: &C,
    state: &JoinState,
    recorder_tx: &UnboundedSender<RecorderEvent>,
) {
    for stream in StreamId::ALL {
        let Some(slot) = state.slot(stream) else {
            continue;
        };
        if slot.finished {
            continue;
        }
        if let Err(e) = capture.stop_recording(stream).await {
            warn!(%stream, error = %e, "Stream failed to stop");
            let _ = recorder_tx.send(RecorderEvent::failed(stream, &slot.path, e.to_string()));
        }
    }
}
