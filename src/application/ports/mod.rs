//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod media;
pub mod notifier;
pub mod storage;

// Re-export common types
pub use capture::{CaptureSession, RecordingError};
pub use config::ConfigStore;
pub use media::{ExportError, ExportStatus, Exporter, MediaError, MediaProbe};
pub use notifier::{NotificationError, NotificationIcon, Notifier, SilentNotifier};
pub use storage::{Storage, StorageError};
