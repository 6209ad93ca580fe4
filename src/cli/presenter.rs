//! CLI presenter for output formatting

use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Presenter for CLI output formatting.
/// Status goes to stderr, results (file paths, config values) to stdout.
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Clear the spinner and report success.
    /// The line is printed directly: a hidden (non-tty) bar drops its messages.
    pub fn spinner_success(&mut self, message: &str) {
        self.stop_spinner();
        self.success(message);
    }

    /// Clear the spinner and report failure
    pub fn spinner_fail(&mut self, message: &str) {
        self.stop_spinner();
        self.error(message);
    }

    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output a result line to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Countdown bar for a recording that stops on its own at `total`
    pub fn format_progress(&self, elapsed: Duration, total: Duration) -> String {
        let total_ms = total.as_millis();
        let elapsed_ms = elapsed.as_millis().min(total_ms);
        let remaining_secs = (total_ms - elapsed_ms).div_ceil(1000);

        let bar_width: u128 = 20;
        let filled = if total_ms > 0 {
            (elapsed_ms * bar_width / total_ms) as usize
        } else {
            0
        };
        let empty = bar_width as usize - filled;

        format!(
            "[{}{}] {:>3}s left",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            remaining_secs
        )
    }

    /// Update the spinner with the recording countdown
    pub fn update_recording_progress(&self, elapsed: Duration, total: Duration) {
        let progress = self.format_progress(elapsed, total);
        self.update_spinner(&format!("Recording... {}  (Ctrl-C to stop)", progress));
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
