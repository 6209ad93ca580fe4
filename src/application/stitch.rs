//! Dual capture use case: owns the recording job from start to output file

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::composition::Canvas;
use crate::domain::job::{InvalidStateTransition, JobState, RecordingJob};

use super::compose::CompositionEngine;
use super::join::{JoinConfig, JoinError, JoinEvent, JoinedRecording, RecordingJoinCoordinator};
use super::ports::{CaptureSession, Exporter, MediaProbe, NotificationIcon, Notifier, Storage};

const NOTIFY_TITLE: &str = "Duo Stitch";

/// Errors from the dual capture use case
#[derive(Debug, Error)]
pub enum CaptureUseCaseError {
    #[error("Invalid state transition: {0}")]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Recording failed: {0}")]
    Join(#[from] JoinError),

    #[error("A composition is still running")]
    AlreadyComposing,

    #[error("Job state channel closed")]
    Closed,
}

/// Configuration for capture jobs
#[derive(Debug, Clone, Default)]
pub struct CaptureJobConfig {
    pub canvas: Canvas,
    /// Whether to show notifications
    pub enable_notify: bool,
    /// Keep the raw per-stream recordings after composing
    pub keep_sources: bool,
}

/// Holds the composing flag for the lifetime of one composition
struct ComposingGuard(Arc<AtomicBool>);

impl ComposingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for ComposingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Inner<C, P, E, S, N>
where
    C: CaptureSession + 'static,
    P: MediaProbe,
    E: Exporter,
    S: Storage,
    N: Notifier,
{
    coordinator: RecordingJoinCoordinator<C>,
    engine: CompositionEngine<P, E, S>,
    notifier: N,
    job: Mutex<RecordingJob>,
    state_tx: watch::Sender<JobState>,
    composing: Arc<AtomicBool>,
    config: CaptureJobConfig,
}

impl<C, P, E, S, N> Inner<C, P, E, S, N>
where
    C: CaptureSession + 'static,
    P: MediaProbe + 'static,
    E: Exporter + 'static,
    S: Storage + 'static,
    N: Notifier + 'static,
{
    fn publish(&self, job: &RecordingJob) {
        debug!(state = %job.state(), "Job state changed");
        self.state_tx.send_replace(job.state().clone());
    }

    async fn notify(&self, message: &str, icon: NotificationIcon) {
        if !self.config.enable_notify {
            return;
        }
        if let Err(e) = self.notifier.notify(NOTIFY_TITLE, message, icon).await {
            warn!(error = %e, "Notification failed");
        }
    }

    async fn on_auto_stop(&self, cycle: u64) {
        let mut job = self.job.lock().await;
        if job.is_recording() && job.stop_recording().is_ok() {
            info!(cycle, "Recording auto-stopped");
            self.publish(&job);
        }
    }

    async fn compose(self: Arc<Self>, joined: JoinedRecording) {
        let Some(guard) = ComposingGuard::acquire(&self.composing) else {
            warn!(cycle = joined.cycle, "Composition already running, ignoring join");
            return;
        };

        {
            let mut job = self.job.lock().await;
            if let Err(e) = job.begin_composing() {
                warn!(cycle = joined.cycle, error = %e, "Join arrived for no active job");
                return;
            }
            self.publish(&job);
        }

        for (stream, reason) in &joined.stream_errors {
            warn!(%stream, %reason, "Composing after a recording error");
        }
        self.notify("Composing video...", NotificationIcon::Processing)
            .await;

        let result = self
            .engine
            .compose(&joined.front, &joined.back, &self.config.canvas)
            .await;

        // Release before publishing so a caller reacting to the terminal
        // state can start the next job right away
        drop(guard);

        {
            let mut job = self.job.lock().await;
            let transition = match &result {
                Ok(path) => job.succeed(path.clone()),
                Err(e) => job.fail(e.to_string()),
            };
            if let Err(e) = transition {
                error!(error = %e, "Could not record composition result");
            }
            self.publish(&job);
        }

        match &result {
            Ok(path) => {
                info!(cycle = joined.cycle, output = %path.display(), "Job succeeded");
                self.notify(&format!("Saved {}", path.display()), NotificationIcon::Success)
                    .await;
            }
            Err(e) => {
                warn!(cycle = joined.cycle, error = %e, "Job failed");
                self.notify("Processing failed", NotificationIcon::Error)
                    .await;
            }
        }

        if !self.config.keep_sources {
            self.remove_sources(&joined).await;
        }
    }

    async fn remove_sources(&self, joined: &JoinedRecording) {
        for path in [&joined.front, &joined.back] {
            match self.engine.storage().remove_if_exists(path).await {
                Ok(true) => debug!(path = %path.display(), "Removed source recording"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Failed to remove source recording"),
            }
        }
    }
}

/// Dual capture use case.
///
/// Owns one [`RecordingJob`] at a time and drives it through recording,
/// joining and composition. State changes are published on a watch
/// channel. Must be created inside a tokio runtime.
pub struct DualCaptureUseCase<C, P, E, S, N>
where
    C: CaptureSession + 'static,
    P: MediaProbe + 'static,
    E: Exporter + 'static,
    S: Storage + 'static,
    N: Notifier + 'static,
{
    inner: Arc<Inner<C, P, E, S, N>>,
    join_loop: JoinHandle<()>,
}

impl<C, P, E, S, N> DualCaptureUseCase<C, P, E, S, N>
where
    C: CaptureSession + 'static,
    P: MediaProbe + 'static,
    E: Exporter + 'static,
    S: Storage + 'static,
    N: Notifier + 'static,
{
    /// Create a new use case instance
    pub fn new(
        capture: C,
        join_config: JoinConfig,
        engine: CompositionEngine<P, E, S>,
        notifier: N,
        config: CaptureJobConfig,
    ) -> Self {
        let (coordinator, join_rx) = RecordingJoinCoordinator::new(capture, join_config);
        let (state_tx, _) = watch::channel(JobState::Idle);

        let inner = Arc::new(Inner {
            coordinator,
            engine,
            notifier,
            job: Mutex::new(RecordingJob::new()),
            state_tx,
            composing: Arc::new(AtomicBool::new(false)),
            config,
        });

        let join_loop = tokio::spawn(Self::run_join_loop(Arc::clone(&inner), join_rx));

        Self { inner, join_loop }
    }

    async fn run_join_loop(
        inner: Arc<Inner<C, P, E, S, N>>,
        mut join_rx: UnboundedReceiver<JoinEvent>,
    ) {
        while let Some(event) = join_rx.recv().await {
            match event {
                JoinEvent::AutoStopped { cycle } => inner.on_auto_stop(cycle).await,
                JoinEvent::Joined(joined) => {
                    tokio::spawn(Arc::clone(&inner).compose(joined));
                }
            }
        }
    }

    /// Get current job state
    pub async fn state(&self) -> JobState {
        self.inner.job.lock().await.state().clone()
    }

    /// Receiver of every published job state
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.inner.state_tx.subscribe()
    }

    pub fn is_composing(&self) -> bool {
        self.inner.composing.load(Ordering::SeqCst)
    }

    /// Start a new job. Rejected while another job is in progress.
    pub async fn start_recording(&self) -> Result<u64, CaptureUseCaseError> {
        if self.is_composing() {
            return Err(CaptureUseCaseError::AlreadyComposing);
        }

        let mut job = self.inner.job.lock().await;
        job.start_recording()?;
        self.inner.publish(&job);

        match self.inner.coordinator.start_recording().await {
            Ok(cycle) => {
                drop(job);
                self.inner
                    .notify("Recording started...", NotificationIcon::Recording)
                    .await;
                Ok(cycle)
            }
            Err(e) => {
                job.fail(e.to_string())?;
                self.inner.publish(&job);
                Err(e.into())
            }
        }
    }

    /// Stop both streams. A job already past recording is left alone.
    pub async fn stop_recording(&self) -> Result<(), CaptureUseCaseError> {
        let mut job = self.inner.job.lock().await;
        let current = job.state().clone();
        match current {
            JobState::Idle => {
                job.stop_recording()?;
            }
            JobState::Recording => {
                job.stop_recording()?;
                self.inner.publish(&job);
                drop(job);
                self.inner.coordinator.stop_recording().await?;
            }
            JobState::AwaitingJoin => {
                drop(job);
                self.inner.coordinator.stop_recording().await?;
            }
            JobState::Composing | JobState::Succeeded(_) | JobState::Failed(_) => {
                debug!(state = %current, "Stop requested after recording ended");
            }
        }
        Ok(())
    }

    /// Resolve once the job reaches a terminal state. Returns immediately
    /// when it already has one.
    pub async fn wait_for_completion(&self) -> Result<JobState, CaptureUseCaseError> {
        let mut rx = self.subscribe();
        let state = rx
            .wait_for(JobState::is_terminal)
            .await
            .map_err(|_| CaptureUseCaseError::Closed)?;
        Ok((*state).clone())
    }

    /// Output path of the last successful job
    pub async fn output_path(&self) -> Option<PathBuf> {
        self.state().await.output_path().map(|p| p.to_path_buf())
    }

    /// Release the capture session
    pub async fn shutdown(&self) -> Result<(), CaptureUseCaseError> {
        self.inner.coordinator.shutdown().await?;
        Ok(())
    }
}

impl<C, P, E, S, N> Drop for DualCaptureUseCase<C, P, E, S, N>
where
    C: CaptureSession + 'static,
    P: MediaProbe + 'static,
    E: Exporter + 'static,
    S: Storage + 'static,
    N: Notifier + 'static,
{
    fn drop(&mut self) {
        self.join_loop.abort();
    }
}
