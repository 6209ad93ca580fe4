//! Ctrl-C handling for recording runs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::Colorize;
use tokio::sync::Notify;
use tracing::debug;

/// Exit code for a run aborted with a second Ctrl-C
const EXIT_INTERRUPTED: i32 = 130;

/// Stop request raised by the first Ctrl-C.
///
/// A second Ctrl-C aborts the process without waiting for the recorders
/// or the composition.
pub struct StopSignal {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Raise the stop request
    pub fn trigger(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            self.notify.notify_one();
        }
    }

    /// Resolve once a stop has been requested
    pub async fn requested(&self) {
        if self.is_requested() {
            return;
        }
        self.notify.notified().await;
    }

    /// Listen for Ctrl-C in the background
    pub fn setup(&self) {
        let requested = Arc::clone(&self.requested);
        let notify = Arc::clone(&self.notify);

        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if requested.swap(true, Ordering::SeqCst) {
                    eprintln!("{} Aborted", "✗".red());
                    std::process::exit(EXIT_INTERRUPTED);
                }
                debug!("Stop requested from the terminal");
                notify.notify_one();
            }
        });
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn not_requested_initially() {
        assert!(!StopSignal::new().is_requested());
    }

    #[tokio::test]
    async fn trigger_wakes_waiter() {
        let signal = Arc::new(StopSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.requested().await })
        };
        signal.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(signal.is_requested());
    }

    #[tokio::test]
    async fn requested_after_trigger_returns_immediately() {
        let signal = StopSignal::new();
        signal.trigger();
        signal.trigger();
        tokio::time::timeout(Duration::from_millis(100), signal.requested())
            .await
            .unwrap();
    }
}
