//! Notification adapters

mod notify_rust;

pub use notify_rust::NotifyRustNotifier;

use crate::application::ports::{Notifier, SilentNotifier};

/// Notifier for the current run: desktop notifications when enabled
pub fn create_notifier(enabled: bool) -> Box<dyn Notifier> {
    if enabled {
        Box::new(NotifyRustNotifier::new())
    } else {
        Box::new(SilentNotifier)
    }
}
