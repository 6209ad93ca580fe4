//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces, backed by FFmpeg,
//! the local filesystem and the desktop notification service.

pub mod capture;
pub mod config;
pub mod media;
pub mod notification;
pub mod storage;

pub use capture::{CaptureDevices, FfmpegCaptureSession};
pub use config::XdgConfigStore;
pub use media::{FfmpegExporter, FfprobeMediaProbe};
pub use notification::{create_notifier, NotifyRustNotifier};
pub use storage::LocalVideoStorage;
